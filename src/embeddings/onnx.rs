//! ONNX-based embedding generation
//!
//! Runs a sentence-transformers model locally via ONNX Runtime, producing
//! 384-dimensional unit-normalized embeddings under cosine geometry.

use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use std::path::Path;
use tokenizers::Tokenizer;

use crate::config::{EmbeddingConfig, EMBED_BATCH, EMBED_DIM};
use crate::error::{Error, Result};

use super::batch::{align_batch, BatchOutput};

/// Maximum token sequence length fed to the model.
const MAX_LENGTH: usize = 256;

/// Local text embedder.
pub struct OnnxEmbedder {
    /// ONNX Runtime session
    session: Session,
    /// HuggingFace tokenizer
    tokenizer: Tokenizer,
    /// Embedding dimension
    dim: usize,
}

impl OnnxEmbedder {
    /// Load the model, downloading files into the cache directory when
    /// missing and downloads are allowed.
    pub async fn new(config: &EmbeddingConfig) -> Result<Self> {
        tracing::info!(model = %config.model, "initializing embedder");

        std::fs::create_dir_all(&config.cache_dir)
            .map_err(|e| Error::Config(format!("Failed to create cache directory: {e}")))?;

        let model_path = config.cache_dir.join("model.onnx");
        let tokenizer_path = config.cache_dir.join("tokenizer.json");

        if !model_path.exists() {
            if config.offline {
                return Err(Error::Config(format!(
                    "offline mode but model file missing: {}",
                    model_path.display()
                )));
            }
            download_model(&config.model, &model_path).await?;
        }

        if !tokenizer_path.exists() {
            if config.offline {
                return Err(Error::Config(format!(
                    "offline mode but tokenizer file missing: {}",
                    tokenizer_path.display()
                )));
            }
            download_tokenizer(&config.model, &tokenizer_path).await?;
        }

        let session = Session::builder()
            .map_err(|e| Error::embedding(format!("Failed to create session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| Error::embedding(format!("Failed to set optimization level: {e}")))?
            .with_intra_threads(4)
            .map_err(|e| Error::embedding(format!("Failed to set threads: {e}")))?
            .commit_from_file(&model_path)
            .map_err(|e| Error::embedding(format!("Failed to load model: {e}")))?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| Error::embedding(format!("Failed to load tokenizer: {e}")))?;

        tracing::info!("embedder ready");

        Ok(Self {
            session,
            tokenizer,
            dim: EMBED_DIM,
        })
    }

    /// Embedding dimension.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Embed a single text.
    pub fn embed_one(&mut self, text: &str) -> Result<Vec<f32>> {
        let texts = [text.to_string()];
        let embeddings = self.embed_batch(&texts)?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::embedding("empty embedding result"))
    }

    /// Embed an ordered batch of texts, returning one vector per text in
    /// input order.
    ///
    /// Texts are processed in fixed-size groups, strictly sequentially, so
    /// only one group is ever in flight.
    pub fn embed_batch(&mut self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all = Vec::with_capacity(texts.len());
        for group in texts.chunks(EMBED_BATCH) {
            let output = self.run_group(group)?;
            let mut vectors = align_batch(output, group.len(), self.dim)?;
            for vector in &mut vectors {
                l2_normalize(vector);
            }
            all.extend(vectors);
        }

        if all.len() != texts.len() {
            return Err(Error::EmbeddingShape(format!(
                "got {} vectors for {} inputs",
                all.len(),
                texts.len()
            )));
        }

        Ok(all)
    }

    /// Run one model call and classify the raw output shape.
    fn run_group(&mut self, texts: &[String]) -> Result<BatchOutput> {
        let batch_size = texts.len();

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| Error::embedding(format!("Tokenization failed: {e}")))?;

        let max_len = encodings
            .iter()
            .map(|e| e.get_ids().len())
            .max()
            .unwrap_or(0)
            .min(MAX_LENGTH);

        let mut input_ids = vec![0i64; batch_size * max_len];
        let mut attention_mask = vec![0i64; batch_size * max_len];
        let mut token_type_ids = vec![0i64; batch_size * max_len];

        for (i, encoding) in encodings.iter().enumerate() {
            let ids = encoding.get_ids();
            let mask = encoding.get_attention_mask();
            let types = encoding.get_type_ids();

            let len = ids.len().min(max_len);
            for j in 0..len {
                input_ids[i * max_len + j] = ids[j] as i64;
                attention_mask[i * max_len + j] = mask[j] as i64;
                token_type_ids[i * max_len + j] = types[j] as i64;
            }
        }

        let input_ids_tensor = Tensor::from_array((
            vec![batch_size, max_len],
            input_ids.into_boxed_slice(),
        ))
        .map_err(|e| Error::embedding(format!("Input tensor creation failed: {e}")))?;

        let attention_mask_tensor = Tensor::from_array((
            vec![batch_size, max_len],
            attention_mask.clone().into_boxed_slice(),
        ))
        .map_err(|e| Error::embedding(format!("Attention mask tensor creation failed: {e}")))?;

        let token_type_ids_tensor = Tensor::from_array((
            vec![batch_size, max_len],
            token_type_ids.into_boxed_slice(),
        ))
        .map_err(|e| Error::embedding(format!("Token type tensor creation failed: {e}")))?;

        let inputs = vec![
            ("input_ids", input_ids_tensor.into_dyn()),
            ("attention_mask", attention_mask_tensor.into_dyn()),
            ("token_type_ids", token_type_ids_tensor.into_dyn()),
        ];

        let outputs = self
            .session
            .run(inputs)
            .map_err(|e| Error::embedding(format!("Inference failed: {e}")))?;

        let output_iter: Vec<_> = outputs.iter().collect();
        let output = output_iter
            .iter()
            .find(|(name, _)| *name == "last_hidden_state")
            .or_else(|| output_iter.first())
            .map(|(_, v)| v)
            .ok_or_else(|| Error::embedding("No output tensor"))?;

        let (tensor_shape, tensor_data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::embedding(format!("Failed to extract tensor: {e}")))?;

        let dims: Vec<usize> = tensor_shape.iter().map(|&d| d as usize).collect();

        match dims.len() {
            // Token hidden states: pool to one vector per text
            3 => {
                let hidden = dims[2];
                let data = mean_pool(tensor_data, &attention_mask, batch_size, max_len, hidden);
                Ok(BatchOutput::Batched {
                    batch: dims[0],
                    data,
                })
            }
            // Already pooled, with an explicit batch dimension
            2 => Ok(BatchOutput::Batched {
                batch: dims[0],
                data: tensor_data.to_vec(),
            }),
            // Single vector without a batch dimension
            1 => Ok(BatchOutput::Single(tensor_data.to_vec())),
            rank => Err(Error::EmbeddingShape(format!(
                "output tensor has rank {rank}"
            ))),
        }
    }
}

/// Attention-mask-weighted mean over the sequence axis.
fn mean_pool(
    hidden_states: &[f32],
    attention_mask: &[i64],
    batch_size: usize,
    max_len: usize,
    hidden: usize,
) -> Vec<f32> {
    let mut pooled = vec![0.0f32; batch_size * hidden];

    for i in 0..batch_size {
        let row = &mut pooled[i * hidden..(i + 1) * hidden];
        let mut count = 0.0f32;

        for j in 0..max_len {
            let mask_val = attention_mask[i * max_len + j] as f32;
            if mask_val > 0.0 {
                let offset = i * max_len * hidden + j * hidden;
                for (k, slot) in row.iter_mut().enumerate() {
                    if let Some(value) = hidden_states.get(offset + k) {
                        *slot += value * mask_val;
                    }
                }
                count += mask_val;
            }
        }

        if count > 0.0 {
            for slot in row.iter_mut() {
                *slot /= count;
            }
        }
    }

    pooled
}

/// Scale to unit length; zero vectors stay zero.
fn l2_normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}

/// Download the ONNX model from the Hugging Face hub.
async fn download_model(model_name: &str, path: &Path) -> Result<()> {
    let url = format!(
        "https://huggingface.co/sentence-transformers/{model_name}/resolve/main/onnx/model.onnx"
    );
    download_file(&url, path, "model").await
}

/// Download the tokenizer definition from the Hugging Face hub.
async fn download_tokenizer(model_name: &str, path: &Path) -> Result<()> {
    let url = format!(
        "https://huggingface.co/sentence-transformers/{model_name}/resolve/main/tokenizer.json"
    );
    download_file(&url, path, "tokenizer").await
}

async fn download_file(url: &str, path: &Path, what: &str) -> Result<()> {
    tracing::info!(%url, "downloading {what}");

    let response = reqwest::get(url)
        .await
        .map_err(|e| Error::embedding(format!("Failed to download {what}: {e}")))?;

    if !response.status().is_success() {
        return Err(Error::embedding(format!(
            "{what} download failed: HTTP {}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| Error::embedding(format!("Failed to read {what} bytes: {e}")))?;

    std::fs::write(path, &bytes)
        .map_err(|e| Error::embedding(format!("Failed to save {what}: {e}")))?;

    tracing::info!("{what} downloaded ({} bytes)", bytes.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 4.0];
        l2_normalize(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);

        let mut zero = vec![0.0, 0.0];
        l2_normalize(&mut zero);
        assert_eq!(zero, vec![0.0, 0.0]);
    }

    #[test]
    fn test_mean_pool_respects_mask() {
        // batch 1, seq 2, hidden 2; second position masked out
        let hidden_states = [1.0, 2.0, 100.0, 200.0];
        let mask = [1i64, 0];
        let pooled = mean_pool(&hidden_states, &mask, 1, 2, 2);
        assert_eq!(pooled, vec![1.0, 2.0]);
    }
}
