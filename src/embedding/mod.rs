//! Embedding port: text in, fixed-length vector out.

mod engine;

pub use engine::EmbeddingEngine;

use anyhow::Result;
use async_trait::async_trait;

/// Opaque embedding function over batches of texts.
///
/// Implementations must return one vector per input text, in input order,
/// each of exactly [`dimension`](EmbeddingProvider::dimension) components.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Vector length, fixed for the lifetime of the deployment.
    fn dimension(&self) -> usize;

    /// Embed a single text.
    async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| anyhow::anyhow!("embedding backend returned no vector"))
    }
}
