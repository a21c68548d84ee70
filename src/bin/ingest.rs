//! Batch ingestion binary: index every PDF in the documents directory
//!
//! Run with: cargo run --bin manual-rag-ingest

use manual_rag::{
    config::Config, embeddings::OnnxEmbedder, ingestion::IngestPipeline, store::QdrantStore,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "manual_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Documents: {}", config.ingest.docs_dir.display());
    tracing::info!("  - Vector store: {}", config.store.url);
    tracing::info!("  - Collection: {}", config.store.collection);

    let store = QdrantStore::new(&config.store)?;
    let embedder = OnnxEmbedder::new(&config.embeddings).await?;

    let mut pipeline = IngestPipeline::new(embedder, store);
    let report = pipeline.run(&config.ingest.docs_dir).await?;

    println!(
        "Ingested {} chunks from {} files ({} pages ok, {} pages failed)",
        report.chunks, report.files, report.pages_ok, report.pages_failed
    );
    for failure in &report.failures {
        match failure.page {
            Some(page) => eprintln!("  {} p.{}: {}", failure.filename, page, failure.error),
            None => eprintln!("  {}: {}", failure.filename, failure.error),
        }
    }

    Ok(())
}
