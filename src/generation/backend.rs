//! Completion backends behind one capability interface
//!
//! Two interchangeable services can generate the answer, differing only in
//! request/response shape: an OpenAI-style chat-completions endpoint and an
//! Ollama-style generate endpoint. Configuration picks one; everything else
//! talks to the `CompletionBackend` trait.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{CompletionKind, LlmConfig};
use crate::error::{Error, Result};

use super::prompt::ChatMessage;

/// Sampling parameters forwarded to the completion service.
#[derive(Debug, Clone)]
pub struct ModelParams {
    /// Model identifier
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
}

/// One capability: turn a message sequence into assistant text.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Generate the assistant's reply for `messages`.
    async fn complete(&self, messages: &[ChatMessage], params: &ModelParams) -> Result<String>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Construct the backend selected by configuration.
pub fn backend_for(config: &LlmConfig) -> Arc<dyn CompletionBackend> {
    match config.backend {
        CompletionKind::Chat => Arc::new(ChatBackend::new(config)),
        CompletionKind::Generate => Arc::new(GenerateBackend::new(config)),
    }
}

fn http_client(timeout_secs: u64) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .expect("Failed to create HTTP client")
}

/// Reject a non-success response, preserving the upstream body.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(Error::Completion { status, body })
}

/// OpenAI-style chat completions backend.
pub struct ChatBackend {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}

impl ChatBackend {
    /// Create a chat-completions client.
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: http_client(config.timeout_secs),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl CompletionBackend for ChatBackend {
    async fn complete(&self, messages: &[ChatMessage], params: &ModelParams) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = json!({
            "model": params.model,
            "messages": messages,
            "temperature": params.temperature,
            "stream": false,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let response = check_status(response).await?;

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| Error::internal("completion response had no choices"))
    }

    fn name(&self) -> &'static str {
        "chat"
    }
}

/// Ollama-style generate backend; messages are flattened into one prompt.
pub struct GenerateBackend {
    client: Client,
    base_url: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl GenerateBackend {
    /// Create a generate-endpoint client.
    pub fn new(config: &LlmConfig) -> Self {
        Self {
            client: http_client(config.timeout_secs),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Collapse a message sequence into a single prompt string.
fn flatten_messages(messages: &[ChatMessage]) -> String {
    messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl CompletionBackend for GenerateBackend {
    async fn complete(&self, messages: &[ChatMessage], params: &ModelParams) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let body = json!({
            "model": params.model,
            "prompt": flatten_messages(messages),
            "stream": false,
            "options": {
                "temperature": params.temperature,
            },
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let response = check_status(response).await?;

        let parsed: GenerateResponse = response.json().await?;
        Ok(parsed.response)
    }

    fn name(&self) -> &'static str {
        "generate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_preserves_message_order() {
        let messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: "first".to_string(),
            },
            ChatMessage {
                role: "user".to_string(),
                content: "second".to_string(),
            },
        ];
        assert_eq!(flatten_messages(&messages), "first\n\nsecond");
    }

    #[test]
    fn test_backend_selection() {
        let mut config = LlmConfig::default();
        config.backend = CompletionKind::Chat;
        assert_eq!(backend_for(&config).name(), "chat");
        config.backend = CompletionKind::Generate;
        assert_eq!(backend_for(&config).name(), "generate");
    }

    #[test]
    fn test_chat_response_parsing() {
        let raw = r#"{"choices": [{"message": {"role": "assistant", "content": "Use the DEF switch."}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "Use the DEF switch.");
    }
}
