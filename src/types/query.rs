//! Request types for the query surface

use serde::{Deserialize, Serialize};

/// Request body for `POST /ask`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// The natural-language question
    #[serde(default)]
    pub question: String,
}

/// Request body for `POST /debug/embed`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedRequest {
    /// Text to embed
    #[serde(default)]
    pub text: String,
}
