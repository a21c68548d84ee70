//! Shared application state

use std::sync::Arc;
use tokio::sync::{Mutex, OnceCell};

use crate::config::Config;
use crate::embeddings::OnnxEmbedder;
use crate::error::Result;
use crate::generation::{backend_for, CompletionBackend, ModelParams};
use crate::store::QdrantStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Configuration
    config: Config,
    /// Vector store client
    store: QdrantStore,
    /// Completion backend selected by configuration
    llm: Arc<dyn CompletionBackend>,
    /// Lazily-loaded embedder; first use loads the model exactly once
    embedder: OnceCell<Arc<Mutex<OnnxEmbedder>>>,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: Config) -> Result<Self> {
        let store = QdrantStore::new(&config.store)?;
        let llm = backend_for(&config.llm);
        tracing::info!(backend = llm.name(), "completion backend selected");

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                llm,
                embedder: OnceCell::new(),
            }),
        })
    }

    /// The embedding model handle.
    ///
    /// Loading happens on first use behind a single-flight cell: concurrent
    /// cold-start callers share one load instead of racing.
    pub async fn embedder(&self) -> Result<Arc<Mutex<OnnxEmbedder>>> {
        self.inner
            .embedder
            .get_or_try_init(|| async {
                let embedder = OnnxEmbedder::new(&self.inner.config.embeddings).await?;
                Ok(Arc::new(Mutex::new(embedder)))
            })
            .await
            .cloned()
    }

    /// Get configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the vector store client
    pub fn store(&self) -> &QdrantStore {
        &self.inner.store
    }

    /// Get the completion backend
    pub fn llm(&self) -> &Arc<dyn CompletionBackend> {
        &self.inner.llm
    }

    /// Sampling parameters for the configured model
    pub fn model_params(&self) -> ModelParams {
        ModelParams {
            model: self.inner.config.llm.model.clone(),
            temperature: self.inner.config.llm.temperature,
        }
    }
}
