//! Embedding generation and batch output alignment

mod batch;
mod onnx;

pub use batch::{align_batch, BatchOutput};
pub use onnx::OnnxEmbedder;
