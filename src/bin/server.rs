//! Query service binary
//!
//! Run with: cargo run --bin manual-rag-server

use manual_rag::{config::Config, server::QaServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "manual_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Vector store: {}", config.store.url);
    tracing::info!("  - Collection: {}", config.store.collection);
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Completion model: {}", config.llm.model);

    let server = QaServer::new(config)?;

    println!("\nServer starting on http://{}", server.address());
    println!("Endpoints:");
    println!("  POST /ask          - Ask a question");
    println!("  POST /debug/embed  - Embed arbitrary text");
    println!("  GET  /healthz      - Liveness probe");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
