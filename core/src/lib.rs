pub mod config;
pub mod disk;
pub mod error;
pub mod index;
pub mod ingest;
pub mod memory;
pub mod occurrence;
pub mod persist;
pub mod query;
pub mod ranking;
pub mod stats;
pub mod tokenizer;

pub use disk::{DiskIndex, DiskIndexConfig, SortKey, TermFilePosition};
pub use error::IndexError;
pub use index::{AnyIndex, InvertedIndex, Lexicon};
pub use memory::MemoryIndex;
pub use occurrence::Occurrence;
pub use query::{gather_postings, search, Postings, Query};
pub use ranking::{BooleanModel, Operator, Ranking, RankingModel, VectorModel};
pub use stats::PrecomputedStats;

pub type TermId = u32;
pub type DocId = u32;
