use crate::error::IndexError;
use crate::{DiskIndex, DocId, MemoryIndex, Occurrence, TermId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Term dictionary and document set shared by every index variant.
///
/// Term ids are handed out in first-seen order starting at 0, so
/// `vocabulary[id]` is always the term that received `id`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Lexicon {
    dictionary: HashMap<String, TermId>,
    vocabulary: Vec<String>,
    documents: BTreeSet<DocId>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `term` occurs in `doc_id`, returning its term id and
    /// whether the term was seen for the first time.
    pub fn observe(&mut self, term: &str, doc_id: DocId) -> (TermId, bool) {
        self.documents.insert(doc_id);
        if let Some(&id) = self.dictionary.get(term) {
            return (id, false);
        }
        let id = self.vocabulary.len() as TermId;
        self.dictionary.insert(term.to_string(), id);
        self.vocabulary.push(term.to_string());
        (id, true)
    }

    pub fn term_id(&self, term: &str) -> Option<TermId> {
        self.dictionary.get(term).copied()
    }

    pub fn term(&self, id: TermId) -> Option<&str> {
        self.vocabulary.get(id as usize).map(String::as_str)
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn documents(&self) -> &BTreeSet<DocId> {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }
}

/// Capability shared by the in-memory and disk-backed indexes.
///
/// Lookups for a term that was never indexed return an empty list or zero,
/// never an error.
pub trait InvertedIndex {
    fn lexicon(&self) -> &Lexicon;

    /// Add one `(term, document, frequency)` fact. `term_freq` must be ≥ 1.
    fn index(&mut self, term: &str, doc_id: DocId, term_freq: u32) -> Result<(), IndexError>;

    /// Seal the index. No further `index()` calls are accepted afterwards.
    fn finalize(&mut self) -> Result<(), IndexError>;

    fn occurrence_list(&self, term: &str) -> Result<Vec<Occurrence>, IndexError>;

    fn document_count_with_term(&self, term: &str) -> u32;

    fn vocabulary(&self) -> &[String] {
        self.lexicon().vocabulary()
    }

    fn document_count(&self) -> usize {
        self.lexicon().documents().len()
    }

    fn documents(&self) -> &BTreeSet<DocId> {
        self.lexicon().documents()
    }

    fn term_id(&self, term: &str) -> Option<TermId> {
        self.lexicon().term_id(term)
    }
}

/// An index whose variant is only known at runtime, e.g. after loading a
/// snapshot from disk.
#[derive(Debug, Serialize, Deserialize)]
pub enum AnyIndex {
    Memory(MemoryIndex),
    Disk(DiskIndex),
}

impl AnyIndex {
    pub fn variant(&self) -> &'static str {
        match self {
            AnyIndex::Memory(_) => "memory",
            AnyIndex::Disk(_) => "disk",
        }
    }
}

impl From<MemoryIndex> for AnyIndex {
    fn from(idx: MemoryIndex) -> Self {
        AnyIndex::Memory(idx)
    }
}

impl From<DiskIndex> for AnyIndex {
    fn from(idx: DiskIndex) -> Self {
        AnyIndex::Disk(idx)
    }
}

impl InvertedIndex for AnyIndex {
    fn lexicon(&self) -> &Lexicon {
        match self {
            AnyIndex::Memory(idx) => idx.lexicon(),
            AnyIndex::Disk(idx) => idx.lexicon(),
        }
    }

    fn index(&mut self, term: &str, doc_id: DocId, term_freq: u32) -> Result<(), IndexError> {
        match self {
            AnyIndex::Memory(idx) => idx.index(term, doc_id, term_freq),
            AnyIndex::Disk(idx) => idx.index(term, doc_id, term_freq),
        }
    }

    fn finalize(&mut self) -> Result<(), IndexError> {
        match self {
            AnyIndex::Memory(idx) => idx.finalize(),
            AnyIndex::Disk(idx) => idx.finalize(),
        }
    }

    fn occurrence_list(&self, term: &str) -> Result<Vec<Occurrence>, IndexError> {
        match self {
            AnyIndex::Memory(idx) => idx.occurrence_list(term),
            AnyIndex::Disk(idx) => idx.occurrence_list(term),
        }
    }

    fn document_count_with_term(&self, term: &str) -> u32 {
        match self {
            AnyIndex::Memory(idx) => idx.document_count_with_term(term),
            AnyIndex::Disk(idx) => idx.document_count_with_term(term),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_ids_in_first_seen_order() {
        let mut lex = Lexicon::new();
        assert_eq!(lex.observe("b", 1), (0, true));
        assert_eq!(lex.observe("a", 1), (1, true));
        assert_eq!(lex.observe("b", 2), (0, false));
        assert_eq!(lex.term_id("a"), Some(1));
        assert_eq!(lex.term(0), Some("b"));
        assert_eq!(lex.vocabulary(), ["b".to_string(), "a".to_string()]);
        assert_eq!(lex.documents().len(), 2);
    }
}
