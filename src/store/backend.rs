//! Storage backend contract for the document store.

use anyhow::Result;
use async_trait::async_trait;

use crate::types::{IndexedRecord, MetadataFilter, RetrievalHit};

/// Minimal capability set a vector index must provide.
///
/// Backends return raw similarity hits in descending score order; ranking
/// policy (over-fetch, threshold fallback, dedup, truncation) lives in
/// [`DocumentStore`](crate::store::DocumentStore) so every backend behaves
/// identically.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Create the collection if absent. Idempotent; never reconfigures an
    /// existing collection.
    async fn ensure_collection(&self) -> Result<()>;

    /// Persist a batch of records atomically, keyed by chunk id.
    async fn upsert(&self, records: Vec<IndexedRecord>) -> Result<()>;

    /// Nearest neighbors by cosine similarity, optionally restricted to
    /// records whose metadata matches every filter entry.
    async fn search(
        &self,
        vector: &[f32],
        limit: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalHit>>;

    /// Whether any stored record matches the filter.
    async fn any_match(&self, filter: &MetadataFilter) -> Result<bool>;
}
