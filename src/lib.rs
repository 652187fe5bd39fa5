//! docbuddy - grounded question answering over local documents
//!
//! A retrieval-augmented pipeline: documents are split into overlapping
//! chunks, embedded locally, and indexed in a vector store; at query time
//! the most relevant chunks ground a generated answer.
//!
//! # Architecture
//!
//! - [`chunking`]: sliding-window splitter with sentence-boundary snapping
//! - [`embedding`] / [`generation`]: ports over the two model backends
//! - [`store`]: vector persistence plus the retrieval ranking policy
//! - [`rag`]: the query orchestrator
//! - [`ingest`]: document loading and batch indexing

pub mod errors;
pub mod types;
pub mod config;
pub mod chunking;
pub mod embedding;
pub mod generation;
pub mod store;
pub mod rag;
pub mod ingest;
pub mod cli;

// Re-export commonly used types
pub use errors::{RagError, Result};
pub use types::{DocumentChunk, IndexedRecord, MetadataFilter, QueryResponse, RetrievalHit};
