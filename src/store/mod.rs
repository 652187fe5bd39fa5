//! Document store: persistence plus the retrieval ranking policy.
//!
//! Backends only know how to index and rank vectors; the policy applied on
//! top of every search is fixed here and must run in exactly this order:
//! over-fetch, threshold filter with fallback, dedup by text, truncate.

mod backend;
mod memory;
mod qdrant;

pub use backend::VectorBackend;
pub use memory::InMemoryBackend;
pub use qdrant::QdrantBackend;

use std::collections::HashSet;
use std::sync::Arc;

use crate::errors::{RagError, Result};
use crate::types::{DocumentChunk, IndexedRecord, MetadataFilter, RetrievalHit};

/// Multiplier applied to the requested limit before filtering and dedup.
const OVERFETCH_FACTOR: usize = 2;

/// A named collection of indexed chunks with a fixed dimensionality.
///
/// Writes validate batch shape and vector length up front and fail hard;
/// reads degrade to an empty hit set on backend failure, because the agent
/// has a defined no-context answer and a broken index must not abort a
/// query.
pub struct DocumentStore {
    backend: Arc<dyn VectorBackend>,
    vector_size: usize,
    score_threshold: Option<f32>,
}

impl DocumentStore {
    /// Open the store, creating the backing collection if absent.
    pub async fn open(
        backend: Arc<dyn VectorBackend>,
        vector_size: usize,
        score_threshold: Option<f32>,
    ) -> Result<Self> {
        if vector_size == 0 {
            return Err(RagError::ConfigError(
                "vector_size must be positive".to_string(),
            ));
        }
        backend
            .ensure_collection()
            .await
            .map_err(|e| RagError::StoreError(e.to_string()))?;

        Ok(Self {
            backend,
            vector_size,
            score_threshold,
        })
    }

    pub fn vector_size(&self) -> usize {
        self.vector_size
    }

    /// Persist one batch of chunks and their vectors atomically.
    ///
    /// Texts are not deduplicated at write time; duplicate content is
    /// collapsed at read time instead.
    pub async fn store(&self, chunks: Vec<DocumentChunk>, vectors: Vec<Vec<f32>>) -> Result<()> {
        if chunks.len() != vectors.len() {
            return Err(RagError::BatchMismatch {
                texts: chunks.len(),
                vectors: vectors.len(),
            });
        }
        for vector in &vectors {
            if vector.len() != self.vector_size {
                return Err(RagError::DimensionMismatch {
                    expected: self.vector_size,
                    actual: vector.len(),
                });
            }
        }

        let records: Vec<IndexedRecord> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexedRecord { chunk, vector })
            .collect();

        self.backend
            .upsert(records)
            .await
            .map_err(|e| RagError::StoreError(e.to_string()))
    }

    /// Ranked, filtered, deduplicated nearest neighbors of `query_vector`.
    ///
    /// Backend failures are logged and degrade to "no context" rather than
    /// propagating.
    pub async fn search(
        &self,
        query_vector: &[f32],
        limit: usize,
        filter: Option<&MetadataFilter>,
    ) -> Vec<RetrievalHit> {
        match self.search_ranked(query_vector, limit, filter).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::warn!(error = %e, "retrieval failed, degrading to empty result");
                Vec::new()
            }
        }
    }

    async fn search_ranked(
        &self,
        query_vector: &[f32],
        limit: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalHit>> {
        if query_vector.len() != self.vector_size {
            return Err(RagError::DimensionMismatch {
                expected: self.vector_size,
                actual: query_vector.len(),
            });
        }

        // Over-fetch so the threshold filter and dedup have spare
        // candidates to work with.
        let mut hits = self
            .backend
            .search(query_vector, limit * OVERFETCH_FACTOR, filter)
            .await
            .map_err(|e| RagError::StoreError(e.to_string()))?;

        if let Some(threshold) = self.score_threshold {
            let above: Vec<RetrievalHit> = hits
                .iter()
                .filter(|h| h.score >= threshold)
                .cloned()
                .collect();
            if above.is_empty() {
                // Nothing clears the bar: fall back to the best raw hits
                // instead of reporting no results for a non-empty index.
                tracing::debug!(threshold, "no hits above threshold, using raw top hits");
                hits.truncate(limit);
            } else {
                hits = above;
            }
        }

        let mut seen = HashSet::new();
        hits.retain(|h| seen.insert(h.chunk.text.trim().to_string()));
        hits.truncate(limit);

        Ok(hits)
    }

    /// Whether any indexed record matches the filter. Used as the ingestion
    /// idempotency probe; errors are treated as "not indexed".
    pub async fn contains(&self, filter: &MetadataFilter) -> bool {
        match self.backend.any_match(filter).await {
            Ok(found) => found,
            Err(e) => {
                tracing::warn!(error = %e, "idempotency probe failed, assuming not indexed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::source_filter;
    use anyhow::anyhow;
    use async_trait::async_trait;

    fn chunk(source: &str, position: usize, text: &str) -> DocumentChunk {
        DocumentChunk::derive(source, position, text.to_string())
    }

    async fn store_with(
        entries: Vec<(DocumentChunk, Vec<f32>)>,
        threshold: Option<f32>,
    ) -> DocumentStore {
        let backend = Arc::new(InMemoryBackend::new(2));
        let store = DocumentStore::open(backend, 2, threshold).await.unwrap();
        let (chunks, vectors): (Vec<_>, Vec<_>) = entries.into_iter().unzip();
        store.store(chunks, vectors).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_store_rejects_length_mismatch() {
        let backend = Arc::new(InMemoryBackend::new(2));
        let store = DocumentStore::open(backend, 2, None).await.unwrap();
        let result = store.store(vec![chunk("a", 0, "x")], vec![]).await;
        assert!(matches!(result, Err(RagError::BatchMismatch { .. })));
    }

    #[tokio::test]
    async fn test_store_rejects_dimension_mismatch() {
        let backend = Arc::new(InMemoryBackend::new(2));
        let store = DocumentStore::open(backend, 2, None).await.unwrap();
        let result = store
            .store(vec![chunk("a", 0, "x")], vec![vec![1.0, 0.0, 0.0]])
            .await;
        assert!(matches!(
            result,
            Err(RagError::DimensionMismatch {
                expected: 2,
                actual: 3
            })
        ));
    }

    #[tokio::test]
    async fn test_search_ranks_by_score() {
        let store = store_with(
            vec![
                (chunk("a", 0, "orthogonal"), vec![0.0, 1.0]),
                (chunk("a", 1, "aligned"), vec![1.0, 0.0]),
                (chunk("a", 2, "diagonal"), vec![1.0, 1.0]),
            ],
            None,
        )
        .await;

        let hits = store.search(&[1.0, 0.0], 3, None).await;
        assert_eq!(hits[0].chunk.text, "aligned");
        assert_eq!(hits[1].chunk.text, "diagonal");
        assert_eq!(hits[2].chunk.text, "orthogonal");
    }

    #[tokio::test]
    async fn test_threshold_keeps_only_relevant_hits() {
        let store = store_with(
            vec![
                (chunk("a", 0, "aligned"), vec![1.0, 0.0]),
                (chunk("a", 1, "orthogonal"), vec![0.0, 1.0]),
            ],
            Some(0.9),
        )
        .await;

        let hits = store.search(&[1.0, 0.0], 2, None).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.text, "aligned");
    }

    #[tokio::test]
    async fn test_threshold_falls_back_to_raw_hits() {
        // Nothing scores anywhere near 0.99, yet results must not be empty.
        let store = store_with(
            vec![
                (chunk("a", 0, "first"), vec![1.0, 1.0]),
                (chunk("a", 1, "second"), vec![0.0, 1.0]),
            ],
            Some(0.99),
        )
        .await;

        let hits = store.search(&[1.0, 0.0], 1, None).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.text, "first");
    }

    #[tokio::test]
    async fn test_dedup_keeps_highest_scored_occurrence() {
        let store = store_with(
            vec![
                (chunk("a", 0, "repeated text"), vec![1.0, 0.0]),
                (chunk("b", 0, "  repeated text  "), vec![0.5, 0.5]),
                (chunk("a", 1, "unique text"), vec![0.0, 1.0]),
            ],
            None,
        )
        .await;

        let hits = store.search(&[1.0, 0.0], 3, None).await;
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.text, "repeated text");
        assert_eq!(hits[0].chunk.source, "a");
        assert_eq!(hits[1].chunk.text, "unique text");
    }

    #[tokio::test]
    async fn test_search_truncates_to_limit() {
        let store = store_with(
            vec![
                (chunk("a", 0, "one"), vec![1.0, 0.0]),
                (chunk("a", 1, "two"), vec![1.0, 0.1]),
                (chunk("a", 2, "three"), vec![1.0, 0.2]),
            ],
            None,
        )
        .await;

        let hits = store.search(&[1.0, 0.0], 2, None).await;
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_metadata_filter_restricts_search() {
        let store = store_with(
            vec![
                (chunk("a.txt", 0, "from a"), vec![1.0, 0.0]),
                (chunk("b.txt", 0, "from b"), vec![1.0, 0.0]),
            ],
            None,
        )
        .await;

        let filter = source_filter("a.txt");
        let hits = store.search(&[1.0, 0.0], 5, Some(&filter)).await;
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.source, "a.txt");

        assert!(store.contains(&filter).await);
        assert!(!store.contains(&source_filter("missing.txt")).await);
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch_degrades_to_empty() {
        let store = store_with(vec![(chunk("a", 0, "x"), vec![1.0, 0.0])], None).await;
        let hits = store.search(&[1.0, 0.0, 0.0], 3, None).await;
        assert!(hits.is_empty());
    }

    struct BrokenBackend;

    #[async_trait]
    impl VectorBackend for BrokenBackend {
        async fn ensure_collection(&self) -> anyhow::Result<()> {
            Ok(())
        }
        async fn upsert(&self, _records: Vec<IndexedRecord>) -> anyhow::Result<()> {
            Err(anyhow!("collection unreachable"))
        }
        async fn search(
            &self,
            _vector: &[f32],
            _limit: usize,
            _filter: Option<&MetadataFilter>,
        ) -> anyhow::Result<Vec<RetrievalHit>> {
            Err(anyhow!("collection unreachable"))
        }
        async fn any_match(&self, _filter: &MetadataFilter) -> anyhow::Result<bool> {
            Err(anyhow!("collection unreachable"))
        }
    }

    #[tokio::test]
    async fn test_backend_failure_degrades_to_empty() {
        let store = DocumentStore::open(Arc::new(BrokenBackend), 2, None)
            .await
            .unwrap();
        let hits = store.search(&[1.0, 0.0], 3, None).await;
        assert!(hits.is_empty());
        assert!(!store.contains(&source_filter("a.txt")).await);
    }

    #[tokio::test]
    async fn test_store_failure_is_a_hard_error() {
        let store = DocumentStore::open(Arc::new(BrokenBackend), 2, None)
            .await
            .unwrap();
        let result = store.store(vec![chunk("a", 0, "x")], vec![vec![1.0, 0.0]]).await;
        assert!(matches!(result, Err(RagError::StoreError(_))));
    }
}
