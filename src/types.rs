//! Core data model for the retrieval pipeline.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use uuid::Uuid;

/// Metadata key carrying the originating document for every stored chunk.
pub const SOURCE_KEY: &str = "source";

/// A bounded slice of a document's text, the unit of indexing and retrieval.
///
/// Ids are derived deterministically from `(source, position)` so that
/// re-ingesting the same document produces the same ids across restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: Uuid,
    pub text: String,
    pub source: String,
    pub extra_metadata: HashMap<String, JsonValue>,
}

impl DocumentChunk {
    /// Create a chunk with an id derived from its source and position.
    pub fn derive(source: &str, position: usize, text: String) -> Self {
        let name = format!("{}:{}", source, position);
        Self {
            id: Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()),
            text,
            source: source.to_string(),
            extra_metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: &str, value: JsonValue) -> Self {
        self.extra_metadata.insert(key.to_string(), value);
        self
    }
}

/// The unit persisted in the vector store, keyed by chunk id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedRecord {
    pub chunk: DocumentChunk,
    pub vector: Vec<f32>,
}

/// A single search result with its cosine similarity score.
///
/// Ephemeral, produced per search and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalHit {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// Structured answer returned for every query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Generated answer, a fixed no-context statement, or an error statement
    pub answer: String,
    /// Full texts of the retrieved chunks, in relevance order
    pub retrieved_chunks: Vec<String>,
    /// Text of the primary chunk the answer was grounded on
    pub context_used: String,
}

/// Equality constraints over stored metadata, ANDed across keys.
pub type MetadataFilter = HashMap<String, JsonValue>;

/// Build a filter matching a single source document.
pub fn source_filter(source: &str) -> MetadataFilter {
    let mut filter = MetadataFilter::new();
    filter.insert(SOURCE_KEY.to_string(), JsonValue::String(source.to_string()));
    filter
}
