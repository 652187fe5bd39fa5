//! Generation port: prompt in, text out.

mod client;

pub use client::{OllamaGenerator, DEFAULT_MODEL, DEFAULT_OLLAMA_URL};

use anyhow::Result;
use async_trait::async_trait;

/// Opaque text generation function.
///
/// Implementations decode deterministically (no sampling) with a bounded
/// output length, so repeated calls with the same prompt are comparable.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
