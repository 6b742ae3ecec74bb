//! In-memory inverted index for corpora that fit in RAM.

use crate::error::IndexError;
use crate::index::{InvertedIndex, Lexicon};
use crate::{DocId, Occurrence};
use serde::{Deserialize, Serialize};

/// Every posting held in memory, grouped by term in insertion order.
/// Query-ready as soon as occurrences are added; `finalize` does nothing.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MemoryIndex {
    lexicon: Lexicon,
    postings: Vec<Vec<Occurrence>>, // indexed by term id
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InvertedIndex for MemoryIndex {
    fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    fn index(&mut self, term: &str, doc_id: DocId, term_freq: u32) -> Result<(), IndexError> {
        let (term_id, new) = self.lexicon.observe(term, doc_id);
        if new {
            self.postings.push(Vec::new());
        }
        self.postings[term_id as usize].push(Occurrence::new(doc_id, term_id, term_freq));
        Ok(())
    }

    fn finalize(&mut self) -> Result<(), IndexError> {
        Ok(())
    }

    fn occurrence_list(&self, term: &str) -> Result<Vec<Occurrence>, IndexError> {
        Ok(self
            .lexicon
            .term_id(term)
            .map(|id| self.postings[id as usize].clone())
            .unwrap_or_default())
    }

    fn document_count_with_term(&self, term: &str) -> u32 {
        self.lexicon
            .term_id(term)
            .map_or(0, |id| self.postings[id as usize].len() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_occurrences_by_term() {
        let mut idx = MemoryIndex::new();
        idx.index("casa", 1, 2).unwrap();
        idx.index("verde", 1, 1).unwrap();
        idx.index("casa", 2, 5).unwrap();

        let casa = idx.occurrence_list("casa").unwrap();
        assert_eq!(casa.len(), 2);
        assert_eq!(casa[1].document_id, 2);
        assert_eq!(casa[1].term_frequency, 5);
        assert!(casa.iter().all(|o| o.term_id == 0));
        assert_eq!(idx.document_count_with_term("casa"), 2);
        assert_eq!(idx.document_count(), 2);
    }

    #[test]
    fn unknown_terms_are_empty() {
        let mut idx = MemoryIndex::new();
        idx.index("casa", 1, 1).unwrap();
        assert!(idx.occurrence_list("rua").unwrap().is_empty());
        assert_eq!(idx.document_count_with_term("rua"), 0);
    }

    #[test]
    fn finalize_keeps_index_writable() {
        let mut idx = MemoryIndex::new();
        idx.index("a", 1, 1).unwrap();
        idx.finalize().unwrap();
        idx.index("a", 2, 1).unwrap();
        assert_eq!(idx.document_count_with_term("a"), 2);
    }
}
