//! Response types for the query surface

use serde::{Deserialize, Serialize};

/// A similarity hit with its stored payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Document id of the source chunk
    pub doc_id: String,
    /// Source filename
    pub filename: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// Chunk text
    pub text: String,
    /// Cosine similarity score, higher is better
    pub score: f32,
}

/// A (source file, page) provenance pair surfaced with an answer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Citation {
    /// Source filename
    pub filename: String,
    /// Page number (1-indexed)
    pub page: u32,
}

/// Which path produced the answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// No candidates survived the broad search
    NoContext,
    /// Answer grounded in retrieved context
    Retrieval,
}

/// Response body for `POST /ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    /// Generated answer
    pub answer: String,
    /// Which path produced the answer
    pub routed: Route,
    /// Deduplicated source citations
    pub citations: Vec<Citation>,
    /// The context hits handed to the completion backend
    pub used: Vec<SearchHit>,
}

impl AskResponse {
    /// Response for a query with no retrievable context.
    pub fn ungrounded(answer: String) -> Self {
        Self {
            answer,
            routed: Route::NoContext,
            citations: Vec::new(),
            used: Vec::new(),
        }
    }

    /// Response grounded in retrieved context.
    pub fn grounded(answer: String, citations: Vec<Citation>, used: Vec<SearchHit>) -> Self {
        Self {
            answer,
            routed: Route::Retrieval,
            citations,
            used,
        }
    }
}

/// Response body for `POST /debug/embed`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedResponse {
    /// Vector dimension
    pub dim: usize,
    /// The embedding vector
    pub vector: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_wire_format() {
        assert_eq!(
            serde_json::to_string(&Route::NoContext).unwrap(),
            "\"no_context\""
        );
        assert_eq!(
            serde_json::to_string(&Route::Retrieval).unwrap(),
            "\"retrieval\""
        );
    }

    #[test]
    fn test_ungrounded_response_has_no_citations() {
        let response = AskResponse::ungrounded("nothing found".to_string());
        assert_eq!(response.routed, Route::NoContext);
        assert!(response.citations.is_empty());
        assert!(response.used.is_empty());
    }
}
