//! In-memory vector index, used by tests and for offline runs.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;

use crate::store::backend::VectorBackend;
use crate::types::{DocumentChunk, IndexedRecord, MetadataFilter, RetrievalHit, SOURCE_KEY};

/// Brute-force cosine index over a Vec of records.
///
/// Upserts replace records that share a chunk id; ties in similarity keep
/// insertion order (the sort is stable).
pub struct InMemoryBackend {
    vector_size: usize,
    records: RwLock<Vec<IndexedRecord>>,
}

impl InMemoryBackend {
    pub fn new(vector_size: usize) -> Self {
        Self {
            vector_size,
            records: RwLock::new(Vec::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl VectorBackend for InMemoryBackend {
    async fn ensure_collection(&self) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, new_records: Vec<IndexedRecord>) -> Result<()> {
        for record in &new_records {
            if record.vector.len() != self.vector_size {
                return Err(anyhow!(
                    "vector of length {} in a {}-dimensional collection",
                    record.vector.len(),
                    self.vector_size
                ));
            }
        }

        let mut records = self.records.write().await;
        for record in new_records {
            match records.iter_mut().find(|r| r.chunk.id == record.chunk.id) {
                Some(existing) => *existing = record,
                None => records.push(record),
            }
        }
        Ok(())
    }

    async fn search(
        &self,
        vector: &[f32],
        limit: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<RetrievalHit>> {
        let records = self.records.read().await;

        let mut hits: Vec<RetrievalHit> = records
            .iter()
            .filter(|r| filter.map_or(true, |f| matches_filter(&r.chunk, f)))
            .map(|r| RetrievalHit {
                chunk: r.chunk.clone(),
                score: cosine_similarity(vector, &r.vector),
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn any_match(&self, filter: &MetadataFilter) -> Result<bool> {
        let records = self.records.read().await;
        Ok(records.iter().any(|r| matches_filter(&r.chunk, filter)))
    }
}

fn matches_filter(chunk: &DocumentChunk, filter: &MetadataFilter) -> bool {
    filter.iter().all(|(key, value)| {
        if key == SOURCE_KEY {
            matches!(value, JsonValue::String(s) if *s == chunk.source)
        } else {
            chunk.extra_metadata.get(key) == Some(value)
        }
    })
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
