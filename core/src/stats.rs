use crate::error::IndexError;
use crate::index::InvertedIndex;
use crate::ranking::tf_idf;
use crate::DocId;
use std::collections::HashMap;

/// Per-document TF-IDF vector norms, computed once from a finalized index.
/// Must be rebuilt whenever the index is rebuilt.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedStats {
    pub document_count: usize,
    document_norm: HashMap<DocId, f64>,
}

impl PrecomputedStats {
    /// One pass over every term's postings, accumulating squared weights per
    /// document in vocabulary order.
    pub fn compute<I: InvertedIndex + ?Sized>(index: &I) -> Result<Self, IndexError> {
        let document_count = index.document_count();
        let mut squares: HashMap<DocId, f64> = index.documents().iter().map(|&d| (d, 0.0)).collect();

        for term in index.vocabulary() {
            let df = index.document_count_with_term(term);
            if df == 0 {
                continue;
            }
            for occ in index.occurrence_list(term)? {
                if occ.term_frequency == 0 {
                    continue;
                }
                let w = tf_idf(document_count, occ.term_frequency as f64, df);
                *squares.entry(occ.document_id).or_insert(0.0) += w * w;
            }
        }

        let document_norm = squares.into_iter().map(|(d, s)| (d, s.sqrt())).collect();
        tracing::debug!(document_count, "document norms computed");
        Ok(Self { document_count, document_norm })
    }

    /// Norm of `doc_id`'s weight vector; 0 for documents without indexed terms.
    pub fn norm(&self, doc_id: DocId) -> f64 {
        self.document_norm.get(&doc_id).copied().unwrap_or(0.0)
    }

    pub fn norms(&self) -> &HashMap<DocId, f64> {
        &self.document_norm
    }
}
