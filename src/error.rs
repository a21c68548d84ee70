//! Error types for the manual QA service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Result type alias for service operations
pub type Result<T> = std::result::Result<T, Error>;

/// Service errors
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// An external page tool exited non-zero
    #[error("{tool} failed: {message}")]
    ExternalTool { tool: &'static str, message: String },

    /// Optical recognition failed
    #[error("Text recognition failed: {0}")]
    Recognition(String),

    /// Embedding backend returned an unexpected output shape
    #[error("Unexpected embedding output shape: {0}")]
    EmbeddingShape(String),

    /// Embedding generation failed
    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    /// Vector store error
    #[error("Vector store error: {0}")]
    VectorStore(String),

    /// Completion backend returned a non-success status
    #[error("Completion backend error: HTTP {status} - {body}")]
    Completion { status: u16, body: String },

    /// Request failed validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an external tool error from captured stderr
    pub fn external_tool(tool: &'static str, message: impl Into<String>) -> Self {
        Self::ExternalTool {
            tool,
            message: message.into(),
        }
    }

    /// Create an embedding error
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding(message.into())
    }

    /// Create a vector store error
    pub fn vector_store(message: impl Into<String>) -> Self {
        Self::VectorStore(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            Error::Json(_) => (StatusCode::BAD_REQUEST, "json_error"),
            Error::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            Error::ExternalTool { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "external_tool_error"),
            Error::Recognition(_) => (StatusCode::INTERNAL_SERVER_ERROR, "recognition_error"),
            Error::EmbeddingShape(_) | Error::Embedding(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "embedding_error")
            }
            Error::VectorStore(_) => (StatusCode::INTERNAL_SERVER_ERROR, "vector_store_error"),
            Error::Completion { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "completion_error"),
            Error::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
            Error::Http(_) => (StatusCode::INTERNAL_SERVER_ERROR, "http_error"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_tool_message() {
        let err = Error::external_tool("pdftoppm", "no such file");
        assert_eq!(err.to_string(), "pdftoppm failed: no such file");
    }

    #[test]
    fn test_completion_error_keeps_upstream_body() {
        let err = Error::Completion {
            status: 502,
            body: "model not loaded".to_string(),
        };
        assert!(err.to_string().contains("502"));
        assert!(err.to_string().contains("model not loaded"));
    }
}
