use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docscope_core::{
    ensure_corpus_dir, index_directory, AnalyzerOptions, IndexOptions, IndexPaths, IndexWriter, PlainTextExtractor,
    Session,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "docscope-indexer")]
#[command(about = "Build a document index and explore it with search, clustering and ranking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index from every regular file in a directory (replaces any existing index)
    Build {
        /// Corpus directory
        #[arg(long)]
        input: PathBuf,
        /// Output index directory
        #[arg(long)]
        output: PathBuf,
        /// Drop English stopwords
        #[arg(long, default_value_t = false)]
        stopwords: bool,
        /// Apply English stemming
        #[arg(long, default_value_t = false)]
        stem: bool,
        /// Score hits with idf = ln(N/df) instead of ln(1 + N/df)
        #[arg(long, default_value_t = false)]
        plain_idf: bool,
    },
    /// Ranked hits for a free-text query
    Search {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        query: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Centroid clusters of the top hits
    Cluster {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        query: String,
        #[arg(short, long, default_value_t = 3)]
        k: usize,
        /// Fix the random seed for reproducible clusters
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Clusters keyed by each hit's most frequent term
    Terms {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        query: String,
    },
    /// Hits ranked by literal occurrences of the query text
    Rank {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        query: String,
    },
    /// Print a stored document
    Show {
        #[arg(long, default_value = "./index")]
        index: PathBuf,
        name: String,
    },
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output, stopwords, stem, plain_idf } => {
            let options = IndexOptions { analyzer: AnalyzerOptions { stopwords, stem }, smoothed_idf: !plain_idf };
            build_index(&input, &output, options)
        }
        Commands::Search { index, query, limit } => {
            let top = open(&index)?.search(&query, limit)?;
            print_json(&top)
        }
        Commands::Cluster { index, query, k, seed } => {
            let session = open(&index)?;
            let clusters = match seed {
                Some(seed) => session.cluster_by_vector_with_rng(&query, k, &mut StdRng::seed_from_u64(seed))?,
                None => session.cluster_by_vector(&query, k)?,
            };
            let listing: Vec<_> = clusters
                .iter()
                .filter(|c| !c.is_empty())
                .enumerate()
                .map(|(i, c)| json!({ "cluster": i + 1, "documents": c.file_names() }))
                .collect();
            if listing.is_empty() {
                tracing::info!("no clusters for this query");
            }
            print_json(&listing)
        }
        Commands::Terms { index, query } => {
            let clusters = open(&index)?.cluster_by_term(&query)?;
            let listing: Vec<_> = clusters
                .iter()
                .map(|c| {
                    let names: Vec<&str> = c.documents.iter().map(|d| d.name.as_str()).collect();
                    json!({ "term": c.representative_term, "similarity": c.similarity, "documents": names })
                })
                .collect();
            print_json(&listing)
        }
        Commands::Rank { index, query } => {
            let ranked = open(&index)?.rank_by_frequency(&query)?;
            let listing: Vec<_> =
                ranked.iter().map(|r| json!({ "name": r.document.name, "count": r.count })).collect();
            print_json(&listing)
        }
        Commands::Show { index, name } => {
            let doc = open(&index)?.document(&name)?.with_context(|| format!("no document named {name}"))?;
            println!("Filename: {}\n{}\n\n{}", doc.name, "=".repeat(50), doc.content);
            Ok(())
        }
    }
}

fn build_index(input: &Path, output: &Path, options: IndexOptions) -> Result<()> {
    ensure_corpus_dir(input)?;
    let mut writer = IndexWriter::create(IndexPaths::new(output), options)
        .with_context(|| format!("cannot open {} for writing", output.display()))?;
    let summary = index_directory(input, &mut writer, &PlainTextExtractor)?;
    for name in &summary.skipped {
        tracing::warn!(file = %name, "not indexed");
    }
    let stats = writer.commit()?;
    tracing::info!(num_docs = stats.num_docs, num_terms = stats.num_terms, output = %output.display(), "index build complete");
    Ok(())
}

fn open(index: &Path) -> Result<Session> {
    Session::open(index).with_context(|| format!("no index at {}, run `build` first", index.display()))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
