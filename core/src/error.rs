use crate::TermId;

/// Errors raised by index construction and retrieval.
#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    /// `index()` was called after `finalize()`.
    #[error("index is sealed: no occurrences can be added after finalize")]
    Sealed,

    /// Postings were requested from a disk index that has not been finalized.
    #[error("index has not been finalized")]
    NotFinalized,

    /// Fewer than 12 bytes were available to decode an occurrence.
    #[error("truncated occurrence record: {len} of 12 bytes")]
    TruncatedRecord { len: usize },

    /// The run file references a term id the lexicon never assigned.
    #[error("run file references unknown term id {0}")]
    UnknownTermId(TermId),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
