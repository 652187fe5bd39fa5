//! Command-line interface: ingest a corpus, ask questions against it.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Config;
use crate::chunking::Chunker;
use crate::embedding::{EmbeddingEngine, EmbeddingProvider};
use crate::generation::{GenerationProvider, OllamaGenerator};
use crate::ingest::{list_corpus_files, IngestOutcome, IngestReport, Ingestor};
use crate::rag::RagAgent;
use crate::store::{DocumentStore, QdrantBackend};

#[derive(Parser)]
#[command(name = "docbuddy", version, about = "Grounded question answering over your documents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Chunk, embed, and index every document in a folder
    Ingest {
        /// Folder containing .txt and .md documents
        folder: PathBuf,
    },
    /// Answer a single question from the indexed corpus
    Query {
        /// The question to answer
        query: String,
    },
    /// Run a set of canned queries against the index
    Demo,
}

const DEMO_QUERIES: [&str; 4] = [
    "What is the main purpose of the system described in the documents?",
    "What are the different components mentioned?",
    "How does the system process and retrieve information?",
    "What is quantum physics?",
];

struct Components {
    store: Arc<DocumentStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    chunker: Chunker,
}

async fn initialize(config: &Config) -> Result<Components> {
    config.validate()?;

    let backend = Arc::new(QdrantBackend::new(
        &config.store.url,
        &config.store.collection,
        config.store.vector_size,
    )?);
    let store = Arc::new(
        DocumentStore::open(backend, config.store.vector_size, config.store.score_threshold)
            .await
            .context("Failed to open document store")?,
    );

    let embedder: Arc<dyn EmbeddingProvider> =
        Arc::new(EmbeddingEngine::new().context("Failed to initialize embedding model")?);

    let generator: Arc<dyn GenerationProvider> = Arc::new(OllamaGenerator::with_config(
        &config.generation.base_url,
        &config.generation.model,
    )?);

    let chunker = Chunker::new(config.chunking.chunk_size, config.chunking.overlap)?;

    Ok(Components {
        store,
        embedder,
        generator,
        chunker,
    })
}

pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::Ingest { folder } => ingest(&config, folder).await,
        Commands::Query { query } => query_one(&config, &query).await,
        Commands::Demo => demo(&config).await,
    }
}

async fn ingest(config: &Config, folder: PathBuf) -> Result<()> {
    let components = initialize(config).await?;
    let ingestor = Ingestor::new(
        components.chunker,
        components.embedder.clone(),
        components.store.clone(),
    );

    let files = list_corpus_files(&folder)?;
    if files.is_empty() {
        println!("{}", "No .txt or .md documents found in the folder.".yellow());
        return Ok(());
    }

    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut report = IngestReport::default();
    for file in files {
        bar.set_message(file.display().to_string());
        match ingestor.ingest_file(&file).await {
            Ok(IngestOutcome::Indexed { chunks }) => {
                report.indexed += 1;
                report.chunks += chunks;
            }
            Ok(IngestOutcome::Skipped) => report.skipped += 1,
            Err(e) => {
                tracing::error!(file = %file.display(), error = %e, "failed to ingest document");
                report.failed += 1;
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    println!(
        "{} {} indexed ({} chunks), {} skipped, {} failed",
        "Done:".green().bold(),
        report.indexed,
        report.chunks,
        report.skipped,
        report.failed
    );
    Ok(())
}

async fn query_one(config: &Config, query: &str) -> Result<()> {
    let components = initialize(config).await?;
    let agent = RagAgent::new(components.store, components.embedder, components.generator);

    let response = agent.process_query(query).await;
    println!("\n{} {}", "Answer:".green().bold(), response.answer);
    Ok(())
}

async fn demo(config: &Config) -> Result<()> {
    let components = initialize(config).await?;
    let agent = RagAgent::new(components.store, components.embedder, components.generator);

    for query in DEMO_QUERIES {
        println!("\n{} {}", "Query:".cyan().bold(), query);
        let response = agent.process_query(query).await;
        println!("{} {}", "Answer:".green().bold(), response.answer);
        println!("{}", "-".repeat(50));
    }
    Ok(())
}
