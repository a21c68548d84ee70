//! manual-rag: question answering over scanned equipment manuals
//!
//! Ingests printed-manual PDFs into a chunk index, falling back to OCR when a
//! page carries no usable text layer, and answers natural-language questions
//! by grounding an LLM completion in retrieved chunks with source citations.

pub mod config;
pub mod embeddings;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod retrieval;
pub mod server;
pub mod store;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::{
    document::{Chunk, Extraction, Page},
    query::AskRequest,
    response::{AskResponse, Citation, Route, SearchHit},
};
