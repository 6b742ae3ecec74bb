//! Compile-time defaults. Runtime overrides come from CLI flags in the
//! `indexer` and `server` binaries.

/// Size in bytes of one encoded occurrence record.
pub const RECORD_SIZE: usize = 12;

/// Number of occurrences buffered in memory before a disk index spills.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1_000_000;

/// Bumped whenever the snapshot layout in `index.bin` changes.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Results returned by a search when the caller does not ask for a count.
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Upper bound on results per search request.
pub const MAX_SEARCH_LIMIT: usize = 100;

/// Prefix of sorted run files written by the disk index.
pub const RUN_FILE_PREFIX: &str = "run_";

/// Extension of committed run files.
pub const RUN_FILE_EXT: &str = "occ";
