//! Ranking models: boolean set algebra and vector-space TF-IDF.

use crate::query::{Postings, Query};
use crate::stats::PrecomputedStats;
use crate::DocId;
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use std::sync::Arc;

/// Term-frequency weight `1 + log2(freq)`. Callers must not pass 0.
pub fn tf(freq: f64) -> f64 {
    debug_assert!(freq > 0.0, "tf of a zero frequency");
    1.0 + freq.log2()
}

/// Inverse document frequency `log2(n / df)`. Callers must reject `df == 0`.
pub fn idf(n: usize, df: u32) -> f64 {
    debug_assert!(df > 0, "idf of a term with no documents");
    (n as f64 / df as f64).log2()
}

pub fn tf_idf(n: usize, freq: f64, df: u32) -> f64 {
    tf(freq) * idf(n, df)
}

/// Frequency assumed for a candidate document that lacks one of the query terms.
const MISSING_TERM_FREQUENCY: f64 = 0.5;

/// Ordered documents, plus scores when the model produces them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ranking {
    pub documents: Vec<DocId>,
    pub scores: Option<HashMap<DocId, f64>>,
}

pub trait RankingModel {
    /// `postings` maps each query term to its full postings list; terms
    /// missing from the map are treated as having no postings.
    fn ordered_docs(&self, query: &Query, postings: &Postings) -> Ranking;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    And,
    Or,
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "and" => Ok(Operator::And),
            "or" => Ok(Operator::Or),
            other => Err(format!("unknown boolean operator '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BooleanModel {
    pub operator: Operator,
}

impl BooleanModel {
    pub fn new(operator: Operator) -> Self {
        Self { operator }
    }
}

impl RankingModel for BooleanModel {
    /// Documents come back in ascending id order with no scores.
    fn ordered_docs(&self, query: &Query, postings: &Postings) -> Ranking {
        let mut sets = query.terms().map(|term| {
            postings
                .get(term)
                .map(|list| list.iter().map(|o| o.document_id).collect::<BTreeSet<_>>())
                .unwrap_or_default()
        });
        let Some(first) = sets.next() else {
            return Ranking::default();
        };
        let docs = match self.operator {
            Operator::And => sets.fold(first, |acc, s| acc.intersection(&s).copied().collect()),
            Operator::Or => sets.fold(first, |mut acc, s| {
                acc.extend(s);
                acc
            }),
        };
        Ranking { documents: docs.into_iter().collect(), scores: None }
    }
}

/// TF-IDF scoring normalised by precomputed document norms.
#[derive(Debug, Clone)]
pub struct VectorModel {
    stats: Arc<PrecomputedStats>,
}

impl VectorModel {
    pub fn new(stats: Arc<PrecomputedStats>) -> Self {
        Self { stats }
    }
}

impl RankingModel for VectorModel {
    fn ordered_docs(&self, query: &Query, postings: &Postings) -> Ranking {
        let n = self.stats.document_count;

        // (query weight, df, doc -> frequency) for each query term that has postings
        let weighted: Vec<(f64, u32, HashMap<DocId, u32>)> = query
            .iter()
            .filter_map(|(term, occ)| {
                let list = postings.get(term).filter(|l| !l.is_empty())?;
                if occ.term_frequency == 0 {
                    return None;
                }
                let df = list.len() as u32;
                let freqs = list.iter().map(|o| (o.document_id, o.term_frequency)).collect();
                Some((tf_idf(n, occ.term_frequency as f64, df), df, freqs))
            })
            .collect();

        let candidates: BTreeSet<DocId> = weighted
            .iter()
            .flat_map(|(_, _, freqs)| freqs.keys().copied())
            .collect();

        let mut scores = HashMap::with_capacity(candidates.len());
        let mut documents = Vec::with_capacity(candidates.len());
        for doc in candidates {
            let dot: f64 = weighted
                .iter()
                .map(|(q_w, df, freqs)| {
                    let freq = match freqs.get(&doc) {
                        Some(&f) if f > 0 => f as f64,
                        _ => MISSING_TERM_FREQUENCY,
                    };
                    q_w * tf_idf(n, freq, *df)
                })
                .sum();
            let norm = self.stats.norm(doc);
            let score = if norm > 0.0 { dot / norm } else { 0.0 };
            scores.insert(doc, score);
            documents.push(doc);
        }

        documents.sort_by(|a, b| scores[b].total_cmp(&scores[a]));
        Ranking { documents, scores: Some(scores) }
    }
}
