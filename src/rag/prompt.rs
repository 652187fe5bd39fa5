//! Grounded prompt construction.
//!
//! Retrieved chunks are presented as numbered, delimiter-separated blocks in
//! relevance order, followed by an instruction to answer only from that
//! context. The instruction is a contract the generator is expected, not
//! guaranteed, to honor; hallucination remains a residual risk.

use crate::types::RetrievalHit;

/// Statement the generator is instructed to emit when the context does not
/// contain the answer.
pub const NOT_IN_CONTEXT_STATEMENT: &str =
    "The information is not available in the provided context.";

const CHUNK_DELIMITER: &str = "\n\n---\n\n";

/// Build the grounded prompt for a query over retrieved context.
pub fn format_prompt(query: &str, context: &[RetrievalHit]) -> String {
    let context_text = context
        .iter()
        .enumerate()
        .map(|(i, hit)| format!("Chunk {}:\n{}", i + 1, hit.chunk.text.trim()))
        .collect::<Vec<_>>()
        .join(CHUNK_DELIMITER);

    format!(
        "You are a helpful assistant. Use ONLY the context below to answer.\n\
         Combine all the context chunks into a single, detailed, step-by-step response.\n\
         If the answer is not in the context, explicitly say: '{}'\n\n\
         Context:\n{}\n\n\
         Question: {}\n\n\
         Step-by-step Answer:",
        NOT_IN_CONTEXT_STATEMENT, context_text, query
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DocumentChunk;

    fn hit(position: usize, text: &str) -> RetrievalHit {
        RetrievalHit {
            chunk: DocumentChunk::derive("doc.txt", position, text.to_string()),
            score: 1.0,
        }
    }

    #[test]
    fn test_chunks_are_numbered_in_order() {
        let prompt = format_prompt("q?", &[hit(0, "alpha"), hit(1, "beta")]);
        let alpha = prompt.find("Chunk 1:\nalpha").unwrap();
        let beta = prompt.find("Chunk 2:\nbeta").unwrap();
        assert!(alpha < beta);
        assert!(prompt.contains("---"));
    }

    #[test]
    fn test_prompt_carries_query_and_escape_hatch() {
        let prompt = format_prompt("What is chunking?", &[hit(0, "some context")]);
        assert!(prompt.contains("Question: What is chunking?"));
        assert!(prompt.contains(NOT_IN_CONTEXT_STATEMENT));
        assert!(prompt.contains("ONLY the context"));
    }

    #[test]
    fn test_chunk_text_is_trimmed() {
        let prompt = format_prompt("q?", &[hit(0, "  padded  ")]);
        assert!(prompt.contains("Chunk 1:\npadded"));
    }
}
