//! Query orchestration: embed, retrieve, prompt, generate, shape.

mod agent;
mod prompt;

pub use agent::{RagAgent, DEFAULT_RETRIEVE_LIMIT, ERROR_ANSWER, NO_CONTEXT_ANSWER};
pub use prompt::{format_prompt, NOT_IN_CONTEXT_STATEMENT};
