use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tfidx::ingest::DocumentIndexer;
use tfidx::persist::{load_index, save_index, IndexPaths};
use tfidx::tokenizer::{Cleaner, CleanerOptions};
use tfidx::{
    search, AnyIndex, BooleanModel, DiskIndex, DiskIndexConfig, DocId, InvertedIndex, MemoryIndex,
    Operator, PrecomputedStats, Query, RankingModel, SortKey, VectorModel,
};
use tracing_subscriber::{fmt, EnvFilter};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Build and query a TF-IDF inverted index", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index every HTML/text file under a directory (or a single file)
    Build {
        /// Input path; files are named <doc_id>.html or <doc_id>.txt
        #[arg(long)]
        input: PathBuf,
        /// Output index directory
        #[arg(long)]
        output: PathBuf,
        #[arg(long, value_enum, default_value_t = Variant::Disk)]
        variant: Variant,
        /// Occurrences buffered in memory before spilling (disk variant)
        #[arg(long, default_value_t = tfidx::config::DEFAULT_BUFFER_CAPACITY)]
        buffer_capacity: usize,
        /// Run file order: "term" or "document" (disk variant)
        #[arg(long, default_value = "term")]
        sort_key: SortKey,
        #[command(flatten)]
        cleaner: CleanerArgs,
    },
    /// Rank documents against a free-text query
    Search {
        #[arg(long)]
        index: PathBuf,
        #[arg(long)]
        query: String,
        #[arg(long, value_enum, default_value_t = Model::Vector)]
        model: Model,
        /// Number of results to print
        #[arg(short, long, default_value_t = tfidx::config::DEFAULT_SEARCH_LIMIT)]
        k: usize,
        /// Print results as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
        #[command(flatten)]
        cleaner: CleanerArgs,
    },
    /// Print each term with its id and document frequency
    Inspect {
        #[arg(long)]
        index: PathBuf,
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Variant {
    Memory,
    Disk,
}

#[derive(Clone, Copy, ValueEnum)]
enum Model {
    And,
    Or,
    Vector,
}

#[derive(Args)]
struct CleanerArgs {
    /// Snowball stemmer language
    #[arg(long, default_value = "portuguese")]
    language: String,
    /// Comma/newline separated stop-word file (defaults to the built-in Portuguese list)
    #[arg(long)]
    stop_words: Option<PathBuf>,
    #[arg(long, default_value_t = false)]
    keep_stop_words: bool,
    #[arg(long, default_value_t = false)]
    keep_accents: bool,
    #[arg(long, default_value_t = false)]
    no_stemming: bool,
}

impl CleanerArgs {
    fn build(&self) -> Result<Cleaner> {
        let options = CleanerOptions {
            remove_stop_words: !self.keep_stop_words,
            remove_accents: !self.keep_accents,
            stem: !self.no_stemming,
        };
        Cleaner::from_options(&self.language, self.stop_words.as_deref(), options)
    }
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, variant, buffer_capacity, sort_key, cleaner } => {
            let cleaner = cleaner.build()?;
            let index = match variant {
                Variant::Memory => AnyIndex::Memory(MemoryIndex::new()),
                Variant::Disk => {
                    let config = DiskIndexConfig { buffer_capacity, sort_key };
                    AnyIndex::Disk(DiskIndex::create(&output, config)?)
                }
            };
            build_index(&input, &output, index, &cleaner)
        }
        Commands::Search { index, query, model, k, json, cleaner } => {
            run_search(&index, &query, model, k, json, &cleaner.build()?)
        }
        Commands::Inspect { index, limit } => inspect(&index, limit),
    }
}

fn build_index(input: &Path, output: &Path, mut index: AnyIndex, cleaner: &Cleaner) -> Result<()> {
    let start = Instant::now();
    let files = collect_files(input);
    let mut indexed = 0usize;
    {
        let mut indexer = DocumentIndexer::new(&mut index, cleaner);
        for file in &files {
            let Some(doc_id) = doc_id_for(file) else {
                tracing::warn!(path = %file.display(), "skipping file without a numeric name");
                continue;
            };
            let raw = fs::read(file)?;
            let content = String::from_utf8_lossy(&raw);
            let is_html = matches!(
                file.extension().and_then(|s| s.to_str()),
                Some("html" | "htm")
            );
            if is_html {
                indexer.index_html(doc_id, &content)?;
            } else {
                indexer.index_text(doc_id, &content)?;
            }
            indexed += 1;
        }
    }
    index.finalize()?;
    tracing::info!(
        files = indexed,
        num_docs = index.document_count(),
        num_terms = index.vocabulary().len(),
        elapsed_s = start.elapsed().as_secs_f64(),
        "ingested documents"
    );

    save_index(&IndexPaths::new(output), &index)?;
    tracing::info!(output = %output.display(), "index build complete");
    Ok(())
}

/// Every `.html`, `.htm` or `.txt` file under `input`, in name order.
fn collect_files(input: &Path) -> Vec<PathBuf> {
    if input.is_file() {
        return vec![input.to_path_buf()];
    }
    WalkDir::new(input)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| {
            matches!(
                p.extension().and_then(|s| s.to_str()),
                Some("html" | "htm" | "txt")
            )
        })
        .collect()
}

fn doc_id_for(path: &Path) -> Option<DocId> {
    path.file_stem()?.to_str()?.parse().ok()
}

fn run_search(index_dir: &Path, text: &str, model: Model, k: usize, json: bool, cleaner: &Cleaner) -> Result<()> {
    let index = load_index(&IndexPaths::new(index_dir))?;
    let query = Query::parse(text, cleaner);
    let ranker: Box<dyn RankingModel> = match model {
        Model::And => Box::new(BooleanModel::new(Operator::And)),
        Model::Or => Box::new(BooleanModel::new(Operator::Or)),
        Model::Vector => Box::new(VectorModel::new(Arc::new(PrecomputedStats::compute(&index)?))),
    };
    let ranking = search(&index, &query, ranker.as_ref())?;

    let hits: Vec<(DocId, Option<f64>)> = ranking
        .documents
        .iter()
        .take(k)
        .map(|d| (*d, ranking.scores.as_ref().and_then(|s| s.get(d).copied())))
        .collect();
    if json {
        let results: Vec<_> = hits
            .iter()
            .map(|(doc_id, score)| serde_json::json!({ "doc_id": doc_id, "score": score }))
            .collect();
        let out = serde_json::json!({
            "query": text,
            "total_hits": ranking.documents.len(),
            "results": results,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        for (doc_id, score) in hits {
            match score {
                Some(s) => println!("{doc_id}\t{s:.6}"),
                None => println!("{doc_id}"),
            }
        }
    }
    Ok(())
}

fn inspect(index_dir: &Path, limit: Option<usize>) -> Result<()> {
    let index = load_index(&IndexPaths::new(index_dir))?;
    println!(
        "{} index: {} documents, {} terms",
        index.variant(),
        index.document_count(),
        index.vocabulary().len()
    );
    let terms = index.vocabulary().iter().take(limit.unwrap_or(usize::MAX));
    for (term_id, term) in terms.enumerate() {
        let df = index.document_count_with_term(term);
        match &index {
            AnyIndex::Disk(disk) => {
                let offset = disk.term_position(term).and_then(|p| p.file_start_offset);
                println!("{term_id}\t{term}\tdf={df}\toffset={}", offset.map_or("-".to_string(), |o| o.to_string()));
            }
            AnyIndex::Memory(_) => println!("{term_id}\t{term}\tdf={df}"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn builds_from_sharded_directory() {
        let corpus = tempdir().unwrap();
        fs::create_dir_all(corpus.path().join("a")).unwrap();
        fs::create_dir_all(corpus.path().join("b")).unwrap();
        fs::write(corpus.path().join("a/1.html"), "<p>gatos pretos</p>").unwrap();
        fs::write(corpus.path().join("b/2.html"), "<p>gatos brancos</p>").unwrap();
        fs::write(corpus.path().join("b/notes.html"), "<p>ignorado</p>").unwrap();

        let out = tempdir().unwrap();
        let cleaner = Cleaner::portuguese(CleanerOptions::default());
        let config = DiskIndexConfig { buffer_capacity: 1, ..Default::default() };
        let index = AnyIndex::Disk(DiskIndex::create(out.path(), config).unwrap());
        build_index(corpus.path(), out.path(), index, &cleaner).unwrap();

        let loaded = load_index(&IndexPaths::new(out.path())).unwrap();
        assert_eq!(loaded.document_count(), 2);
        let query = Query::parse("gatos", &cleaner);
        let ranking = search(&loaded, &query, &BooleanModel::new(Operator::And)).unwrap();
        assert_eq!(ranking.documents, vec![1, 2]);
    }

    #[test]
    fn doc_ids_come_from_file_stems() {
        assert_eq!(doc_id_for(Path::new("wiki/x/42.html")), Some(42));
        assert_eq!(doc_id_for(Path::new("wiki/x/readme.html")), None);
    }
}
