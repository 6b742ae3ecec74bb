//! Fixed-width occurrence records.
//!
//! On disk every record is three big-endian `u32`s:
//! `[document_id][term_id][term_frequency]`.

use crate::config::RECORD_SIZE;
use crate::error::IndexError;
use crate::{DocId, TermId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::io::{self, Read, Write};

/// One `(document, term, frequency)` fact.
///
/// Ordered by `document_id`, then `term_id`. Two occurrences are equal when
/// they share both ids; the frequency takes no part in comparisons.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Occurrence {
    pub document_id: DocId,
    pub term_id: TermId,
    pub term_frequency: u32,
}

impl Occurrence {
    pub fn new(document_id: DocId, term_id: TermId, term_frequency: u32) -> Self {
        Self { document_id, term_id, term_frequency }
    }

    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[0..4].copy_from_slice(&self.document_id.to_be_bytes());
        buf[4..8].copy_from_slice(&self.term_id.to_be_bytes());
        buf[8..12].copy_from_slice(&self.term_frequency.to_be_bytes());
        buf
    }

    /// Decode a record from the first 12 bytes of `bytes`.
    pub fn decode(bytes: &[u8]) -> Result<Self, IndexError> {
        if bytes.len() < RECORD_SIZE {
            return Err(IndexError::TruncatedRecord { len: bytes.len() });
        }
        let word = |i: usize| u32::from_be_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
        Ok(Self::new(word(0), word(4), word(8)))
    }

    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.to_bytes())
    }

    /// Read the next record from a stream.
    ///
    /// Any short read yields `Ok(None)`: a stream that stops mid-record is
    /// indistinguishable from one that ends cleanly.
    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Option<Self>> {
        let mut buf = [0u8; RECORD_SIZE];
        let mut filled = 0;
        while filled < RECORD_SIZE {
            match r.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        if filled < RECORD_SIZE {
            if filled > 0 {
                tracing::warn!(filled, "occurrence stream ended mid-record, treating as end of stream");
            }
            return Ok(None);
        }
        Ok(Some(Self::new(
            u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]),
            u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]),
            u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]),
        )))
    }
}

impl PartialEq for Occurrence {
    fn eq(&self, other: &Self) -> bool {
        self.document_id == other.document_id && self.term_id == other.term_id
    }
}

impl Eq for Occurrence {}

impl PartialOrd for Occurrence {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Occurrence {
    fn cmp(&self, other: &Self) -> Ordering {
        self.document_id
            .cmp(&other.document_id)
            .then(self.term_id.cmp(&other.term_id))
    }
}

impl std::hash::Hash for Occurrence {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.document_id.hash(state);
        self.term_id.hash(state);
    }
}

impl fmt::Display for Occurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(doc: {} term_id: {} freq: {})", self.document_id, self.term_id, self.term_frequency)
    }
}
