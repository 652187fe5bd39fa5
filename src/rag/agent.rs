//! The RAG agent: one query in, one structured response out.

use std::sync::Arc;

use crate::embedding::EmbeddingProvider;
use crate::generation::GenerationProvider;
use crate::rag::prompt::format_prompt;
use crate::store::DocumentStore;
use crate::types::QueryResponse;

/// Answer returned when retrieval yields no context.
pub const NO_CONTEXT_ANSWER: &str = "No relevant information found in documents.";

/// Answer returned when embedding or generation fails for a query.
pub const ERROR_ANSWER: &str = "Error processing your query.";

/// How many chunks to ground each answer on.
pub const DEFAULT_RETRIEVE_LIMIT: usize = 3;

/// Stateless orchestrator over the store and the two model ports.
///
/// `process_query` never fails: every failure mode maps to a structured
/// response with a fixed answer string, so a broken collaborator degrades a
/// single query instead of crashing the process.
pub struct RagAgent {
    store: Arc<DocumentStore>,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn GenerationProvider>,
    retrieve_limit: usize,
}

impl RagAgent {
    pub fn new(
        store: Arc<DocumentStore>,
        embedder: Arc<dyn EmbeddingProvider>,
        generator: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self {
            store,
            embedder,
            generator,
            retrieve_limit: DEFAULT_RETRIEVE_LIMIT,
        }
    }

    pub fn with_retrieve_limit(mut self, limit: usize) -> Self {
        self.retrieve_limit = limit;
        self
    }

    /// Run one query through the full pipeline.
    pub async fn process_query(&self, query: &str) -> QueryResponse {
        // Stage 1: embed the query. No fallback here; without a vector
        // there is nothing to retrieve against.
        let query_vector = match self.embedder.embed_one(query).await {
            Ok(vector) => vector,
            Err(e) => {
                tracing::error!(error = %e, "query embedding failed");
                return Self::error_response();
            }
        };

        // Stage 2: retrieve. An empty result is a defined outcome, not an
        // error, and skips generation entirely.
        let context = self
            .store
            .search(&query_vector, self.retrieve_limit, None)
            .await;

        let retrieved_chunks: Vec<String> =
            context.iter().map(|hit| hit.chunk.text.clone()).collect();
        let context_used = context
            .first()
            .map(|hit| hit.chunk.text.clone())
            .unwrap_or_else(|| "No context found".to_string());

        tracing::debug!(
            query,
            retrieved = context.len(),
            top_score = context.first().map(|h| h.score),
            "retrieval complete"
        );

        if context.is_empty() {
            tracing::warn!(query, "no relevant context found");
            return QueryResponse {
                answer: NO_CONTEXT_ANSWER.to_string(),
                retrieved_chunks,
                context_used,
            };
        }

        // Stages 3 and 4: build the grounded prompt and generate.
        let prompt = format_prompt(query, &context);
        let answer = match self.generator.generate(&prompt).await {
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                tracing::error!(error = %e, "generation failed");
                return QueryResponse {
                    answer: ERROR_ANSWER.to_string(),
                    retrieved_chunks,
                    context_used,
                };
            }
        };

        // Stage 5: shape the response.
        QueryResponse {
            answer,
            retrieved_chunks,
            context_used,
        }
    }

    fn error_response() -> QueryResponse {
        QueryResponse {
            answer: ERROR_ANSWER.to_string(),
            retrieved_chunks: Vec::new(),
            context_used: "No context found".to_string(),
        }
    }
}
