//! Document, page, and chunk types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a page's text was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extraction {
    /// Extracted from the PDF text layer
    Direct,
    /// Recognized from a rasterized page image
    Recognized,
}

/// One page of a source document, immutable after acquisition.
#[derive(Debug, Clone)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,
    /// Raw text produced by the extraction path
    pub text: String,
    /// Which extraction path produced the text
    pub method: Extraction,
}

/// A bounded span of one page's normalized text, the unit indexed and retrieved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Point id in the vector collection
    pub id: Uuid,
    /// Document id derived from the source filename
    pub doc_id: String,
    /// Source filename
    pub filename: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// Chunk text, non-empty after trimming
    pub text: String,
}

impl Chunk {
    /// Create a chunk with a freshly generated id.
    pub fn new(doc_id: impl Into<String>, filename: impl Into<String>, page: u32, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            doc_id: doc_id.into(),
            filename: filename.into(),
            page,
            text: text.into(),
        }
    }
}

/// Derive a document id from its source filename.
pub fn doc_id_for(filename: &str) -> String {
    let stem = filename.rsplit_once('.').map(|(s, _)| s).unwrap_or(filename);
    stem.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}
