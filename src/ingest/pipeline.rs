//! Ingestion pipeline: chunk a document, embed its chunks, store the batch.

use std::path::Path;
use std::sync::Arc;

use serde_json::json;

use crate::chunking::Chunker;
use crate::embedding::EmbeddingProvider;
use crate::errors::{RagError, Result};
use crate::ingest::loader::{list_corpus_files, load_document};
use crate::store::DocumentStore;
use crate::types::{source_filter, DocumentChunk};

/// What happened to a single document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Chunked, embedded, and stored
    Indexed { chunks: usize },
    /// Already present in the store, nothing written
    Skipped,
}

/// Batch summary for a folder ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub indexed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub chunks: usize,
}

/// Drives documents through chunking and embedding into the store.
pub struct Ingestor {
    chunker: Chunker,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<DocumentStore>,
}

impl Ingestor {
    pub fn new(
        chunker: Chunker,
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<DocumentStore>,
    ) -> Self {
        Self {
            chunker,
            embedder,
            store,
        }
    }

    /// Ingest one document, skipping it if its source is already indexed.
    ///
    /// The whole document is written in one store call; an embedding failure
    /// aborts before anything is persisted, so a document is never partially
    /// indexed.
    pub async fn ingest_file(&self, path: &Path) -> Result<IngestOutcome> {
        let source = path.display().to_string();

        if self.store.contains(&source_filter(&source)).await {
            tracing::info!(source = %source, "already indexed, skipping");
            return Ok(IngestOutcome::Skipped);
        }

        let content = load_document(path)?;
        let texts = self.chunker.chunk(&content);
        if texts.is_empty() {
            tracing::warn!(source = %source, "document produced no chunks");
            return Ok(IngestOutcome::Indexed { chunks: 0 });
        }

        tracing::info!(source = %source, chunks = texts.len(), "chunked document");
        for (i, text) in texts.iter().take(2).enumerate() {
            let preview: String = text.chars().take(100).collect();
            tracing::debug!(chunk = i + 1, preview = %preview, "chunk preview");
        }

        let vectors = self
            .embedder
            .embed(&texts)
            .await
            .map_err(|e| RagError::EmbeddingError(e.to_string()))?;

        let indexed_at = chrono::Utc::now().timestamp();
        let chunks: Vec<DocumentChunk> = texts
            .into_iter()
            .enumerate()
            .map(|(position, text)| {
                DocumentChunk::derive(&source, position, text)
                    .with_metadata("position", json!(position))
                    .with_metadata("indexed_at", json!(indexed_at))
            })
            .collect();

        let count = chunks.len();
        self.store.store(chunks, vectors).await?;
        tracing::info!(source = %source, chunks = count, "document indexed");

        Ok(IngestOutcome::Indexed { chunks: count })
    }

    /// Ingest every supported file in a folder.
    ///
    /// One failing document is logged and skipped; the rest of the batch
    /// still goes through.
    pub async fn ingest_dir(&self, folder: &Path) -> Result<IngestReport> {
        let files = list_corpus_files(folder)?;
        if files.is_empty() {
            tracing::warn!(folder = %folder.display(), "no ingestable documents found");
        }

        let mut report = IngestReport::default();
        for file in files {
            match self.ingest_file(&file).await {
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
        }

        Ok(report)
    }
}
