//! Core types for the manual QA service

pub mod document;
pub mod query;
pub mod response;

pub use document::{doc_id_for, Chunk, Extraction, Page};
pub use query::{AskRequest, EmbedRequest};
pub use response::{AskResponse, Citation, EmbedResponse, Route, SearchHit};
