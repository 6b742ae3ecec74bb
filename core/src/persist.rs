use crate::config::SNAPSHOT_VERSION;
use crate::error::IndexError;
use crate::index::{AnyIndex, InvertedIndex};
use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize, Deserialize)]
pub struct MetaFile {
    pub variant: String,
    pub num_docs: u32,
    pub num_terms: u32,
    pub created_at: String,
    pub version: u32,
}

/// Layout of a saved index directory:
/// `index.bin` (bincode snapshot), `meta.json`, and for the disk variant
/// the committed run file.
pub struct IndexPaths {
    pub root: PathBuf,
}

impl IndexPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    fn snapshot(&self) -> PathBuf { self.root.join("index.bin") }
    fn meta(&self) -> PathBuf { self.root.join("meta.json") }
}

/// Write the whole index object plus its meta file. A disk index must be
/// finalized; its run file is copied into the index directory if it lives
/// elsewhere.
pub fn save_index(paths: &IndexPaths, index: &AnyIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    if let AnyIndex::Disk(disk) = index {
        if !disk.is_sealed() {
            bail!(IndexError::NotFinalized);
        }
        if let (Some(src), Some(name)) = (disk.run_path(), disk.run_file_name()) {
            let dst = paths.root.join(name);
            let same = match (fs::canonicalize(&src), fs::canonicalize(&dst)) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            };
            if !same {
                fs::copy(&src, &dst)?;
            }
        }
    }

    let mut f = File::create(paths.snapshot())?;
    let bytes = bincode::serialize(index)?;
    f.write_all(&bytes)?;

    let meta = MetaFile {
        variant: index.variant().to_string(),
        num_docs: index.document_count() as u32,
        num_terms: index.vocabulary().len() as u32,
        created_at: time::OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default(),
        version: SNAPSHOT_VERSION,
    };
    save_meta(paths, &meta)?;
    tracing::info!(root = %paths.root.display(), variant = %meta.variant, num_docs = meta.num_docs, "index saved");
    Ok(())
}

pub fn load_index(paths: &IndexPaths) -> Result<AnyIndex> {
    let meta = load_meta(paths)?;
    if meta.version != SNAPSHOT_VERSION {
        bail!("unsupported index version {} (expected {})", meta.version, SNAPSHOT_VERSION);
    }
    let mut f = File::open(paths.snapshot())?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    let mut index: AnyIndex = bincode::deserialize(&buf)?;
    if let AnyIndex::Disk(disk) = &mut index {
        disk.attach(paths.root.clone());
    }
    tracing::info!(root = %paths.root.display(), variant = index.variant(), num_docs = meta.num_docs, "index loaded");
    Ok(index)
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let mut f = File::create(paths.meta())?;
    let json = serde_json::to_string_pretty(meta)?;
    f.write_all(json.as_bytes())?;
    Ok(())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta())?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}
