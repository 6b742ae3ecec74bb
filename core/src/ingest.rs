//! Feeding cleaned documents into an index.

use crate::error::IndexError;
use crate::index::InvertedIndex;
use crate::tokenizer::{html_to_plain_text, Cleaner};
use crate::DocId;

/// Cleans documents with an injected `Cleaner` and adds one occurrence per
/// distinct term to the wrapped index.
pub struct DocumentIndexer<'a, I: InvertedIndex + ?Sized> {
    index: &'a mut I,
    cleaner: &'a Cleaner,
}

impl<'a, I: InvertedIndex + ?Sized> DocumentIndexer<'a, I> {
    pub fn new(index: &'a mut I, cleaner: &'a Cleaner) -> Self {
        Self { index, cleaner }
    }

    /// Index an HTML document. Returns the number of distinct terms added.
    pub fn index_html(&mut self, doc_id: DocId, html: &str) -> Result<usize, IndexError> {
        self.index_text(doc_id, &html_to_plain_text(html))
    }

    pub fn index_text(&mut self, doc_id: DocId, text: &str) -> Result<usize, IndexError> {
        let counts = self.cleaner.term_counts(text);
        for (term, freq) in &counts {
            self.index.index(term, doc_id, *freq)?;
        }
        Ok(counts.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::CleanerOptions;
    use crate::MemoryIndex;

    #[test]
    fn one_occurrence_per_distinct_term() {
        let cleaner = Cleaner::portuguese(CleanerOptions { stem: false, ..Default::default() });
        let mut idx = MemoryIndex::new();
        let added = DocumentIndexer::new(&mut idx, &cleaner)
            .index_html(3, "<p>gato <b>gato</b> rato</p>")
            .unwrap();
        assert_eq!(added, 2);
        let gato = idx.occurrence_list("gato").unwrap();
        assert_eq!(gato.len(), 1);
        assert_eq!(gato[0].term_frequency, 2);
        assert_eq!(gato[0].document_id, 3);
    }
}
