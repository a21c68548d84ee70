//! HTTP server for the question-answering service

pub mod routes;
pub mod state;

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Config;
use crate::error::{Error, Result};
use state::AppState;

/// The question-answering HTTP server.
pub struct QaServer {
    config: Config,
    state: AppState,
}

impl QaServer {
    /// Create a server from configuration.
    pub fn new(config: Config) -> Result<Self> {
        let state = AppState::new(config.clone())?;
        Ok(Self { config, state })
    }

    /// Build the router with all routes.
    fn build_router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/ask", post(routes::ask))
            .route("/debug/embed", post(routes::debug_embed))
            .route("/healthz", get(routes::healthz))
            .with_state(self.state.clone())
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    /// Start serving; runs until the process is stopped.
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.server.host, self.config.server.port)
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {e}")))?;

        let router = self.build_router();

        tracing::info!("starting server on http://{addr}");

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind: {e}")))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::internal(format!("Server error: {e}")))?;

        Ok(())
    }

    /// The address the server will bind.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}
