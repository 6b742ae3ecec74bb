//! Disk-backed inverted index built by external merge sort.
//!
//! Occurrences accumulate in a fixed-capacity buffer. When the buffer fills
//! it is sorted in place and merged with the current sorted run file into a
//! new run, so at any point there is exactly one globally sorted run on disk
//! and at most one buffer's worth of occurrences in memory.
//!
//! A new run is written to `run_<n>.occ.tmp`, fsynced, then renamed into
//! place; the previous run is deleted only after the rename. A crash during
//! a merge leaves the previous run intact and a `.tmp` file to discard.

use crate::config::{DEFAULT_BUFFER_CAPACITY, RECORD_SIZE, RUN_FILE_EXT, RUN_FILE_PREFIX};
use crate::error::IndexError;
use crate::index::{InvertedIndex, Lexicon};
use crate::{DocId, Occurrence, TermId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Order of records inside a run file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortKey {
    /// `(term_id, document_id)`: each term's postings are contiguous, so a
    /// lookup seeks to the term's offset and reads exactly its records.
    #[default]
    TermMajor,
    /// `(document_id, term_id)`: the natural `Occurrence` order. Lookups
    /// scan from the term's first record to the end of the file.
    DocumentMajor,
}

impl SortKey {
    pub fn compare(self, a: &Occurrence, b: &Occurrence) -> Ordering {
        match self {
            SortKey::DocumentMajor => a.cmp(b),
            SortKey::TermMajor => a
                .term_id
                .cmp(&b.term_id)
                .then(a.document_id.cmp(&b.document_id)),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "term" | "term-major" => Ok(SortKey::TermMajor),
            "document" | "document-major" => Ok(SortKey::DocumentMajor),
            other => Err(format!("unknown sort key '{other}' (expected 'term' or 'document')")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DiskIndexConfig {
    /// Occurrences held in memory before a spill. Values below 1 are treated as 1.
    pub buffer_capacity: usize,
    pub sort_key: SortKey,
}

impl Default for DiskIndexConfig {
    fn default() -> Self {
        Self { buffer_capacity: DEFAULT_BUFFER_CAPACITY, sort_key: SortKey::default() }
    }
}

/// Where a term's postings live in the run file. Both optional fields are
/// filled in by `finalize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermFilePosition {
    pub term_id: TermId,
    pub file_start_offset: Option<u64>,
    pub document_frequency: Option<u32>,
}

impl TermFilePosition {
    pub fn new(term_id: TermId) -> Self {
        Self { term_id, file_start_offset: None, document_frequency: None }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiskIndex {
    lexicon: Lexicon,
    positions: Vec<TermFilePosition>, // indexed by term id
    config: DiskIndexConfig,
    /// File name of the committed run, relative to `run_dir`.
    current_run: Option<String>,
    run_counter: u32,
    sealed: bool,
    #[serde(skip)]
    run_dir: PathBuf,
    /// Allocated once at `buffer_capacity` and cleared between spills, so the
    /// ingest path never frees or regrows it.
    #[serde(skip)]
    buffer: Vec<Occurrence>,
}

impl DiskIndex {
    /// Create an empty index that writes its run files under `run_dir`.
    pub fn create<P: AsRef<Path>>(run_dir: P, mut config: DiskIndexConfig) -> Result<Self, IndexError> {
        config.buffer_capacity = config.buffer_capacity.max(1);
        fs::create_dir_all(run_dir.as_ref())?;
        Ok(Self {
            lexicon: Lexicon::new(),
            positions: Vec::new(),
            config,
            current_run: None,
            run_counter: 0,
            sealed: false,
            run_dir: run_dir.as_ref().to_path_buf(),
            buffer: Vec::with_capacity(config.buffer_capacity),
        })
    }

    pub fn config(&self) -> &DiskIndexConfig {
        &self.config
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn run_file_name(&self) -> Option<&str> {
        self.current_run.as_deref()
    }

    pub fn run_path(&self) -> Option<PathBuf> {
        self.current_run.as_ref().map(|name| self.run_dir.join(name))
    }

    pub fn term_position(&self, term: &str) -> Option<&TermFilePosition> {
        self.lexicon.term_id(term).map(|id| &self.positions[id as usize])
    }

    /// Point the index at the directory that now holds its run file.
    pub(crate) fn attach(&mut self, run_dir: PathBuf) {
        self.run_dir = run_dir;
    }

    /// Every record of the committed run, in file order.
    pub fn read_run(&self) -> Result<Vec<Occurrence>, IndexError> {
        let Some(path) = self.run_path() else {
            return Ok(Vec::new());
        };
        let mut reader = BufReader::new(File::open(path)?);
        let mut out = Vec::new();
        while let Some(occ) = Occurrence::read_from(&mut reader)? {
            out.push(occ);
        }
        Ok(out)
    }

    /// Sort the buffer and merge it into a new run file.
    fn spill(&mut self) -> Result<(), IndexError> {
        if self.buffer.is_empty() {
            return Ok(());
        }
        let key = self.config.sort_key;
        self.buffer.sort_unstable_by(|a, b| key.compare(a, b));

        let next_name = format!("{RUN_FILE_PREFIX}{}.{RUN_FILE_EXT}", self.run_counter);
        let tmp_path = self.run_dir.join(format!("{next_name}.tmp"));
        let previous = self.run_path();

        let written = match write_run(&tmp_path, previous.as_deref(), &self.buffer, key) {
            Ok(n) => n,
            Err(e) => {
                let _ = fs::remove_file(&tmp_path);
                return Err(e.into());
            }
        };

        fs::rename(&tmp_path, self.run_dir.join(&next_name))?;
        if let Some(old) = previous {
            fs::remove_file(old)?;
        }
        tracing::debug!(
            run = %next_name,
            spilled = self.buffer.len(),
            total = written,
            "spilled occurrence buffer"
        );
        self.current_run = Some(next_name);
        self.run_counter += 1;
        self.buffer.clear();
        Ok(())
    }
}

/// Write `buffered` (already sorted by `key`) merged with the run at
/// `previous` into a fresh file at `path`. Returns the number of records.
fn write_run(path: &Path, previous: Option<&Path>, buffered: &[Occurrence], key: SortKey) -> io::Result<u64> {
    let mut out = BufWriter::new(File::create(path)?);
    let written = match previous {
        None => {
            for occ in buffered {
                occ.write_to(&mut out)?;
            }
            buffered.len() as u64
        }
        Some(prev) => {
            let mut reader = BufReader::new(File::open(prev)?);
            merge_into(&mut reader, buffered, key, &mut out)?
        }
    };
    out.flush()?;
    out.into_inner().map_err(|e| e.into_error())?.sync_all()?;
    Ok(written)
}

/// Two-way merge of a sorted record stream with a sorted slice.
fn merge_into<R: io::Read, W: Write>(
    run: &mut R,
    buffered: &[Occurrence],
    key: SortKey,
    out: &mut W,
) -> io::Result<u64> {
    let mut from_run = Occurrence::read_from(run)?;
    let mut next = 0;
    let mut written = 0u64;
    loop {
        match (from_run, buffered.get(next)) {
            (Some(r), Some(b)) => {
                if key.compare(&r, b) == Ordering::Less {
                    r.write_to(out)?;
                    from_run = Occurrence::read_from(run)?;
                } else {
                    b.write_to(out)?;
                    next += 1;
                }
            }
            (Some(r), None) => {
                r.write_to(out)?;
                from_run = Occurrence::read_from(run)?;
            }
            (None, Some(b)) => {
                b.write_to(out)?;
                next += 1;
            }
            (None, None) => break,
        }
        written += 1;
    }
    Ok(written)
}

impl InvertedIndex for DiskIndex {
    fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    fn index(&mut self, term: &str, doc_id: DocId, term_freq: u32) -> Result<(), IndexError> {
        if self.sealed {
            return Err(IndexError::Sealed);
        }
        let (term_id, new) = self.lexicon.observe(term, doc_id);
        if new {
            self.positions.push(TermFilePosition::new(term_id));
        }
        self.buffer.push(Occurrence::new(doc_id, term_id, term_freq));
        if self.buffer.len() >= self.config.buffer_capacity {
            self.spill()?;
        }
        Ok(())
    }

    /// Spill what is left, then scan the run once to record each term's
    /// first byte offset and record count.
    fn finalize(&mut self) -> Result<(), IndexError> {
        if self.sealed {
            return Ok(());
        }
        self.spill()?;
        self.buffer = Vec::new();

        let mut records = 0u64;
        if let Some(path) = self.run_path() {
            let mut reader = BufReader::new(File::open(path)?);
            while let Some(occ) = Occurrence::read_from(&mut reader)? {
                let pos = self
                    .positions
                    .get_mut(occ.term_id as usize)
                    .ok_or(IndexError::UnknownTermId(occ.term_id))?;
                pos.file_start_offset.get_or_insert(records * RECORD_SIZE as u64);
                *pos.document_frequency.get_or_insert(0) += 1;
                records += 1;
            }
        }
        self.sealed = true;
        tracing::info!(
            records,
            terms = self.lexicon.len(),
            documents = self.lexicon.documents().len(),
            "disk index finalized"
        );
        Ok(())
    }

    fn occurrence_list(&self, term: &str) -> Result<Vec<Occurrence>, IndexError> {
        if !self.sealed {
            return Err(IndexError::NotFinalized);
        }
        let Some(term_id) = self.lexicon.term_id(term) else {
            return Ok(Vec::new());
        };
        let pos = &self.positions[term_id as usize];
        let (Some(offset), Some(df), Some(path)) =
            (pos.file_start_offset, pos.document_frequency, self.run_path())
        else {
            return Ok(Vec::new());
        };

        let mut reader = BufReader::new(File::open(path)?);
        reader.seek(SeekFrom::Start(offset))?;
        let mut out = Vec::with_capacity(df as usize);
        while out.len() < df as usize {
            match Occurrence::read_from(&mut reader)? {
                Some(occ) if occ.term_id == term_id => out.push(occ),
                Some(_) if self.config.sort_key == SortKey::DocumentMajor => continue,
                _ => break,
            }
        }
        Ok(out)
    }

    fn document_count_with_term(&self, term: &str) -> u32 {
        self.term_position(term)
            .and_then(|pos| pos.document_frequency)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryIndex;
    use tempfile::tempdir;

    const TERMS: [&str; 5] = ["amor", "bola", "casa", "dado", "erva"];

    /// Deterministic shuffled `(term, doc, freq)` triples, one per term per doc.
    fn corpus(docs: u32) -> Vec<(&'static str, DocId, u32)> {
        let mut triples = Vec::new();
        let mut seed = 17u32;
        for doc in (1..=docs).rev() {
            for (i, term) in TERMS.iter().enumerate() {
                seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
                if (seed >> 16) % 3 != 0 || i == 0 {
                    triples.push((*term, doc, (seed >> 8) % 4 + 1));
                }
            }
        }
        triples
    }

    fn build(dir: &Path, capacity: usize, sort_key: SortKey) -> DiskIndex {
        let mut idx = DiskIndex::create(dir, DiskIndexConfig { buffer_capacity: capacity, sort_key }).unwrap();
        for (term, doc, freq) in corpus(12) {
            idx.index(term, doc, freq).unwrap();
        }
        idx.finalize().unwrap();
        idx
    }

    #[test]
    fn run_is_sorted_and_complete_for_any_capacity() {
        let expected = corpus(12).len();
        for sort_key in [SortKey::DocumentMajor, SortKey::TermMajor] {
            for capacity in [1, 2, 3, 7, 1000] {
                let dir = tempdir().unwrap();
                let idx = build(dir.path(), capacity, sort_key);
                let run = idx.read_run().unwrap();
                assert_eq!(run.len(), expected, "capacity {capacity}");
                assert!(run
                    .windows(2)
                    .all(|w| sort_key.compare(&w[0], &w[1]) != Ordering::Greater));
            }
        }
    }

    #[test]
    fn only_the_committed_run_remains() {
        let dir = tempdir().unwrap();
        let idx = build(dir.path(), 4, SortKey::TermMajor);
        let files: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(files, vec![idx.run_file_name().unwrap().to_string()]);
    }

    #[test]
    fn finalize_records_offset_and_document_frequency() {
        let dir = tempdir().unwrap();
        let mut idx = DiskIndex::create(dir.path(), DiskIndexConfig::default()).unwrap();
        idx.index("x", 1, 1).unwrap();
        idx.index("y", 1, 3).unwrap();
        idx.index("x", 2, 1).unwrap();
        idx.finalize().unwrap();

        let x = idx.term_position("x").unwrap();
        assert_eq!(x.document_frequency, Some(2));
        assert_eq!(x.file_start_offset, Some(0));
        let y = idx.term_position("y").unwrap();
        assert_eq!(y.file_start_offset, Some(2 * RECORD_SIZE as u64));
        assert_eq!(idx.document_count_with_term("x"), 2);

        idx.finalize().unwrap();
        assert_eq!(idx.document_count_with_term("x"), 2);
    }

    #[test]
    fn postings_match_the_memory_index() {
        let mut mem = MemoryIndex::new();
        for (term, doc, freq) in corpus(12) {
            mem.index(term, doc, freq).unwrap();
        }
        for sort_key in [SortKey::DocumentMajor, SortKey::TermMajor] {
            let dir = tempdir().unwrap();
            let disk = build(dir.path(), 5, sort_key);
            for term in TERMS {
                let mut expected: Vec<_> = mem
                    .occurrence_list(term)
                    .unwrap()
                    .into_iter()
                    .map(|o| (o.document_id, o.term_frequency))
                    .collect();
                expected.sort();
                let got: Vec<_> = disk
                    .occurrence_list(term)
                    .unwrap()
                    .into_iter()
                    .map(|o| (o.document_id, o.term_frequency))
                    .collect();
                assert_eq!(got, expected, "{term} with {sort_key:?}");
                assert_eq!(disk.document_count_with_term(term), mem.document_count_with_term(term));
            }
        }
    }

    #[test]
    fn sealed_index_rejects_new_occurrences() {
        let dir = tempdir().unwrap();
        let mut idx = build(dir.path(), 3, SortKey::TermMajor);
        assert!(matches!(idx.index("amor", 99, 1), Err(IndexError::Sealed)));
    }

    #[test]
    fn lookups_require_finalize() {
        let dir = tempdir().unwrap();
        let mut idx = DiskIndex::create(dir.path(), DiskIndexConfig::default()).unwrap();
        idx.index("amor", 1, 1).unwrap();
        assert!(matches!(idx.occurrence_list("amor"), Err(IndexError::NotFinalized)));
    }

    #[test]
    fn empty_index_finalizes_cleanly() {
        let dir = tempdir().unwrap();
        let mut idx = DiskIndex::create(dir.path(), DiskIndexConfig::default()).unwrap();
        idx.finalize().unwrap();
        assert!(idx.run_path().is_none());
        assert!(idx.occurrence_list("amor").unwrap().is_empty());
        assert_eq!(idx.document_count_with_term("amor"), 0);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let dir = tempdir().unwrap();
        let mut idx = DiskIndex::create(dir.path(), DiskIndexConfig { buffer_capacity: 0, ..Default::default() }).unwrap();
        idx.index("a", 1, 1).unwrap();
        assert_eq!(idx.buffered(), 0);
        assert!(idx.run_path().is_some());
    }

    #[test]
    fn failed_merge_keeps_previous_run() {
        let dir = tempdir().unwrap();
        let config = DiskIndexConfig { buffer_capacity: 1, ..Default::default() };
        let mut idx = DiskIndex::create(dir.path(), config).unwrap();
        idx.index("amor", 1, 1).unwrap();
        assert_eq!(idx.run_file_name(), Some("run_0.occ"));

        // a directory where the next run's tmp file should go makes the write fail
        let blocker = dir.path().join("run_1.occ.tmp");
        fs::create_dir(&blocker).unwrap();
        assert!(matches!(idx.index("bola", 2, 1), Err(IndexError::Io(_))));
        assert_eq!(idx.run_file_name(), Some("run_0.occ"));
        assert_eq!(idx.read_run().unwrap().len(), 1);

        fs::remove_dir(&blocker).unwrap();
        idx.finalize().unwrap();
        let run = idx.read_run().unwrap();
        assert_eq!(run.len(), 2);
        assert_eq!(idx.document_count_with_term("bola"), 1);
        assert_eq!(idx.occurrence_list("amor").unwrap()[0].document_id, 1);
    }

    #[test]
    fn parses_sort_keys() {
        assert_eq!("term".parse::<SortKey>().unwrap(), SortKey::TermMajor);
        assert_eq!("document-major".parse::<SortKey>().unwrap(), SortKey::DocumentMajor);
        assert!("random".parse::<SortKey>().is_err());
    }
}
