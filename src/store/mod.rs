//! Vector collection access over HTTP

mod qdrant;

pub use qdrant::QdrantStore;
