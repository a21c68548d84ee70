//! Configuration for the manual QA service

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Target chunk size in characters.
pub const CHUNK_SIZE: usize = 900;
/// Characters of shared context between consecutive chunks.
pub const CHUNK_OVERLAP: usize = 120;
/// Direct extraction shorter than this falls back to recognition.
pub const MIN_DIRECT_TEXT: usize = 30;
/// Raster resolution for the recognition path, in DPI.
pub const RASTER_DPI: u32 = 300;
/// Embedding dimension of the collection.
pub const EMBED_DIM: usize = 384;
/// Chunk texts per embedding call during ingestion.
pub const EMBED_BATCH: usize = 24;
/// Candidate count for the broad similarity search.
pub const BROAD_RECALL: usize = 24;
/// Minimum similarity for a candidate to stay in context.
pub const SCORE_FLOOR: f32 = 0.45;
/// Maximum context chunks handed to the completion backend.
pub const CONTEXT_CAP: usize = 6;
/// Maximum distinct citations returned with an answer.
pub const CITATION_CAP: usize = 3;

/// Main service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Ingestion configuration
    pub ingest: IngestConfig,
    /// Embedding configuration
    pub embeddings: EmbeddingConfig,
    /// Vector store configuration
    pub store: StoreConfig,
    /// Completion backend configuration
    pub llm: LlmConfig,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0"),
                port: env_parsed("PORT", 8080)?,
            },
            ingest: IngestConfig {
                docs_dir: PathBuf::from(env_or("DOCS_DIR", "./docs")),
            },
            embeddings: EmbeddingConfig {
                model: env_or("EMBED_MODEL", "all-MiniLM-L6-v2"),
                cache_dir: env::var("MODEL_CACHE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| EmbeddingConfig::default().cache_dir),
                offline: env_truthy("HF_OFFLINE"),
            },
            store: StoreConfig {
                url: env_or("QDRANT_URL", "http://localhost:6333"),
                collection: env_or("QDRANT_COLLECTION", "manual_chunks"),
            },
            llm: LlmConfig {
                backend: env_or("LLM_BACKEND", "chat").parse()?,
                base_url: env_or("LLM_URL", "http://localhost:11434"),
                model: env_or("LLM_MODEL", "llama3.2:3b"),
                ..LlmConfig::default()
            },
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            ingest: IngestConfig::default(),
            embeddings: EmbeddingConfig::default(),
            store: StoreConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Directory scanned for PDF documents
    pub docs_dir: PathBuf,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            docs_dir: PathBuf::from("./docs"),
        }
    }
}

/// Embedding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Sentence-transformers model identifier
    pub model: String,
    /// Cache directory for model and tokenizer files
    pub cache_dir: PathBuf,
    /// When set, never download model files
    pub offline: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "all-MiniLM-L6-v2".to_string(),
            cache_dir: dirs::cache_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("manual-rag")
                .join("models"),
            offline: false,
        }
    }
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Vector store base URL
    pub url: String,
    /// Collection name
    pub collection: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_string(),
            collection: "manual_chunks".to_string(),
        }
    }
}

/// Which request/response shape the completion service speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionKind {
    /// OpenAI-style chat completions
    Chat,
    /// Ollama-style generate completions
    Generate,
}

impl FromStr for CompletionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "chat" => Ok(Self::Chat),
            "generate" => Ok(Self::Generate),
            other => Err(Error::Config(format!(
                "unknown LLM_BACKEND '{other}' (expected 'chat' or 'generate')"
            ))),
        }
    }
}

/// Completion backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Request/response shape selector
    pub backend: CompletionKind,
    /// Completion service base URL
    pub base_url: String,
    /// Generation model name
    pub model: String,
    /// Temperature for generation
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            backend: CompletionKind::Chat,
            base_url: "http://localhost:11434".to_string(),
            model: "llama3.2:3b".to_string(),
            temperature: 0.2,
            timeout_secs: 120,
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parsed<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("could not parse {key}='{raw}'"))),
        Err(_) => Ok(default),
    }
}

fn env_truthy(key: &str) -> bool {
    matches!(
        env::var(key).unwrap_or_default().to_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_kind_parsing() {
        assert_eq!("chat".parse::<CompletionKind>().unwrap(), CompletionKind::Chat);
        assert_eq!(
            "GENERATE".parse::<CompletionKind>().unwrap(),
            CompletionKind::Generate
        );
        assert!("openai".parse::<CompletionKind>().is_err());
    }

    #[test]
    fn test_defaults_are_consistent() {
        let config = Config::default();
        assert_eq!(config.store.collection, "manual_chunks");
        assert_eq!(config.embeddings.model, "all-MiniLM-L6-v2");
        assert!(!config.embeddings.offline);
    }
}
