//! Document ingestion pipeline: acquisition, normalization, chunking

pub mod acquire;
mod chunker;
mod normalize;
mod pipeline;

pub use chunker::Chunker;
pub use normalize::Normalizer;
pub use pipeline::{IngestPipeline, IngestReport, PageFailure};
