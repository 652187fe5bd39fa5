//! Error types for the docbuddy retrieval pipeline.
//!
//! Configuration problems fail fast before any work starts; failures in the
//! retrieval and generation path are recovered at their owning layer and
//! never surface to the agent's callers.

use thiserror::Error;

/// Main error type for the retrieval pipeline
#[derive(Error, Debug)]
pub enum RagError {
    /// Invalid chunker parameters (overlap must stay below chunk size)
    #[error("Invalid chunking config: chunk_size={chunk_size}, overlap={overlap}: {reason}")]
    InvalidChunking {
        chunk_size: usize,
        overlap: usize,
        reason: String,
    },

    /// Vector length does not match the collection's dimensionality
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Batch arguments of unequal length
    #[error("Batch length mismatch: {texts} texts vs {vectors} vectors")]
    BatchMismatch { texts: usize, vectors: usize },

    /// Document format the loader does not handle
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    /// Embedding backend errors
    #[error("Embedding failed: {0}")]
    EmbeddingError(String),

    /// Vector store backend errors
    #[error("Vector store error: {0}")]
    StoreError(String),

    /// Generation backend errors
    #[error("Generation failed: {0}")]
    GenerationError(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, RagError>;

/// Convert anyhow errors to RagError
impl From<anyhow::Error> for RagError {
    fn from(err: anyhow::Error) -> Self {
        RagError::Generic(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_display() {
        let err = RagError::DimensionMismatch {
            expected: 384,
            actual: 768,
        };
        assert!(err.to_string().contains("384"));
        assert!(err.to_string().contains("768"));
    }

    #[test]
    fn test_invalid_chunking_display() {
        let err = RagError::InvalidChunking {
            chunk_size: 50,
            overlap: 50,
            reason: "overlap must be smaller than chunk_size".to_string(),
        };
        assert!(err.to_string().contains("chunk_size=50"));
        assert!(err.to_string().contains("overlap=50"));
    }
}
