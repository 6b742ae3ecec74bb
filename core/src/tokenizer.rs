//! Text cleaning: HTML extraction, normalization, stop-word removal and
//! stemming. A `Cleaner` is built once and handed to whoever needs it.

use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::Stemmer;
use scraper::Html;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::Path;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

pub use rust_stemmers::Algorithm;

lazy_static! {
    static ref RE: Regex = Regex::new(r"(?u)\p{L}[\p{L}\p{N}_']*").expect("valid regex");
}

/// Portuguese stop words, accents already stripped.
const PORTUGUESE_STOP_WORDS: &[&str] = &[
    "a","ao","aos","aquela","aquelas","aquele","aqueles","aquilo","as","ate",
    "com","como","da","das","de","dela","delas","dele","deles","depois","do","dos",
    "e","ela","elas","ele","eles","em","entre","era","eram","eramos","essa","essas","esse","esses",
    "esta","estamos","estao","estas","estava","estavam","estavamos","este","esteja","estejam",
    "estejamos","estes","esteve","estive","estivemos","estiver","estivera","estiveram","estiveramos",
    "estiverem","estivermos","estivesse","estivessem","estivessemos","estou","eu",
    "foi","fomos","for","fora","foram","foramos","forem","formos","fosse","fossem","fossemos","fui",
    "ha","haja","hajam","hajamos","hao","havemos","hei","houve","houvemos","houver","houvera",
    "houveram","houveramos","houverao","houverei","houverem","houveremos","houveria","houveriam",
    "houveriamos","houvermos","houvesse","houvessem","houvessemos",
    "isso","isto","ja","lhe","lhes","mais","mas","me","mesmo","meu","meus","minha","minhas","muito",
    "na","nao","nas","nem","no","nos","nossa","nossas","nosso","nossos","num","numa",
    "o","os","ou","para","pela","pelas","pelo","pelos","por","qual","quais","quando","que","quem",
    "sao","se","seja","sejam","sejamos","sem","sera","serao","serei","seremos","seria","seriam",
    "seriamos","seu","seus","so","somos","sou","sua","suas",
    "tambem","te","tem","temos","tenha","tenham","tenhamos","tenho","tera","terao","terei",
    "teremos","teria","teriam","teriamos","teu","teus","teve","tinha","tinham","tinhamos","tive",
    "tivemos","tiver","tivera","tiveram","tiveramos","tiverem","tivermos","tivesse","tivessem",
    "tivessemos","tu","tua","tuas","um","uma","voce","voces","vos",
];

/// Which cleaning steps run after lowercasing.
#[derive(Debug, Clone, Copy)]
pub struct CleanerOptions {
    pub remove_stop_words: bool,
    pub remove_accents: bool,
    pub stem: bool,
}

impl Default for CleanerOptions {
    fn default() -> Self {
        Self { remove_stop_words: true, remove_accents: true, stem: true }
    }
}

pub struct Cleaner {
    stemmer: Stemmer,
    stop_words: HashSet<String>,
    options: CleanerOptions,
}

impl Cleaner {
    /// Stop words are stored without accents and matched against the
    /// accent-free form of each token, so "não" is dropped whether or not
    /// accent removal is enabled.
    pub fn new(algorithm: Algorithm, stop_words: HashSet<String>, options: CleanerOptions) -> Self {
        let stop_words = stop_words
            .into_iter()
            .map(|w| remove_accents(&w.trim().to_lowercase()))
            .filter(|w| !w.is_empty())
            .collect();
        Self { stemmer: Stemmer::create(algorithm), stop_words, options }
    }

    /// Build a cleaner from a Snowball language name and an optional
    /// stop-word file (the built-in Portuguese list when `None`).
    pub fn from_options(language: &str, stop_words: Option<&Path>, options: CleanerOptions) -> anyhow::Result<Self> {
        let algorithm = algorithm_from_name(language)
            .ok_or_else(|| anyhow::anyhow!("unsupported stemmer language '{language}'"))?;
        let stop_words = match stop_words {
            Some(path) => Self::read_stop_words(path)?,
            None => default_stop_words(),
        };
        Ok(Self::new(algorithm, stop_words, options))
    }

    /// Portuguese stemming with the built-in stop-word list.
    pub fn portuguese(options: CleanerOptions) -> Self {
        Self::new(Algorithm::Portuguese, default_stop_words(), options)
    }

    /// Read stop words separated by commas and/or newlines.
    pub fn read_stop_words<P: AsRef<Path>>(path: P) -> io::Result<HashSet<String>> {
        let text = fs::read_to_string(path)?;
        Ok(text
            .split(|c: char| c == ',' || c == '\n' || c == '\r')
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect())
    }

    pub fn is_stop_word(&self, term: &str) -> bool {
        if term.is_ascii() {
            self.stop_words.contains(term)
        } else {
            self.stop_words.contains(&remove_accents(term))
        }
    }

    /// Lowercase and, if enabled, strip accents.
    pub fn preprocess_text(&self, text: &str) -> String {
        let lower = text.to_lowercase();
        if self.options.remove_accents {
            remove_accents(&lower)
        } else {
            lower
        }
    }

    /// Drop stop words and stem what is left.
    pub fn preprocess_word(&self, token: &str) -> Option<String> {
        if self.options.remove_stop_words && self.is_stop_word(token) {
            return None;
        }
        if self.options.stem {
            Some(self.stemmer.stem(token).into_owned())
        } else {
            Some(token.to_string())
        }
    }

    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let clean = self.preprocess_text(text);
        RE.find_iter(&clean)
            .filter_map(|m| self.preprocess_word(m.as_str()))
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Count of each cleaned term in `text`.
    pub fn term_counts(&self, text: &str) -> BTreeMap<String, u32> {
        let mut counts = BTreeMap::new();
        for term in self.tokenize(text) {
            *counts.entry(term).or_insert(0) += 1;
        }
        counts
    }
}

pub fn default_stop_words() -> HashSet<String> {
    PORTUGUESE_STOP_WORDS.iter().map(|w| w.to_string()).collect()
}

/// Resolve a Snowball algorithm by its lowercase language name.
pub fn algorithm_from_name(name: &str) -> Option<Algorithm> {
    Some(match name.to_ascii_lowercase().as_str() {
        "portuguese" => Algorithm::Portuguese,
        "english" => Algorithm::English,
        "spanish" => Algorithm::Spanish,
        "french" => Algorithm::French,
        "german" => Algorithm::German,
        "italian" => Algorithm::Italian,
        "dutch" => Algorithm::Dutch,
        _ => return None,
    })
}

/// Text content of an HTML document or fragment. Malformed markup is tolerated.
pub fn html_to_plain_text(html: &str) -> String {
    Html::parse_fragment(html).root_element().text().collect()
}

pub fn remove_accents(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).nfc().collect()
}
