use crate::error::IndexError;
use crate::index::InvertedIndex;
use crate::ranking::{Ranking, RankingModel};
use crate::tokenizer::Cleaner;
use crate::Occurrence;
use std::collections::{BTreeMap, HashMap};

/// Postings for each query term, keyed by term.
pub type Postings = HashMap<String, Vec<Occurrence>>;

/// A parsed query: each distinct term mapped to a synthetic occurrence whose
/// frequency is the number of times the term appears in the query text.
#[derive(Debug, Clone, Default)]
pub struct Query {
    terms: BTreeMap<String, Occurrence>,
}

impl Query {
    /// Build a query from already-normalized terms.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map: BTreeMap<String, Occurrence> = BTreeMap::new();
        for term in terms {
            let next_id = map.len() as u32;
            map.entry(term.as_ref().to_string())
                .or_insert_with(|| Occurrence::new(0, next_id, 0))
                .term_frequency += 1;
        }
        Self { terms: map }
    }

    /// Clean raw query text the same way documents were cleaned.
    pub fn parse(text: &str, cleaner: &Cleaner) -> Self {
        Self::from_terms(cleaner.tokenize(text))
    }

    pub fn get(&self, term: &str) -> Option<&Occurrence> {
        self.terms.get(term)
    }

    pub fn terms(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Occurrence)> {
        self.terms.iter().map(|(t, o)| (t.as_str(), o))
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

/// Fetch the postings list of every query term. Unindexed terms map to an
/// empty list.
pub fn gather_postings<I: InvertedIndex + ?Sized>(index: &I, query: &Query) -> Result<Postings, IndexError> {
    query
        .terms()
        .map(|term| Ok((term.to_string(), index.occurrence_list(term)?)))
        .collect()
}

pub fn search<I, M>(index: &I, query: &Query, model: &M) -> Result<Ranking, IndexError>
where
    I: InvertedIndex + ?Sized,
    M: RankingModel + ?Sized,
{
    let postings = gather_postings(index, query)?;
    Ok(model.ordered_docs(query, &postings))
}
