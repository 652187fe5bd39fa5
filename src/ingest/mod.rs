//! Document ingestion: load, chunk, embed, index.

mod loader;
mod pipeline;

pub use loader::{list_corpus_files, load_document};
pub use pipeline::{IngestOutcome, IngestReport, Ingestor};
