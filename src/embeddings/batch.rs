//! Alignment of backend batch output into fixed-dimension vectors
//!
//! Embedding backends are inconsistent about batch output: some return one
//! result per input, some one combined buffer with a leading batch
//! dimension, and a one-text batch may come back as a single bare vector.
//! `align_batch` folds all of these into exactly N input-order vectors, or
//! fails; a count mismatch is an integrity violation, never papered over by
//! truncating or padding.

use crate::error::{Error, Result};

/// Raw shapes an embedding backend may hand back for one batch call.
#[derive(Debug, Clone)]
pub enum BatchOutput {
    /// One independent result per input text
    PerText(Vec<Vec<f32>>),
    /// One combined buffer with a leading batch-size dimension
    Batched { batch: usize, data: Vec<f32> },
    /// A single bare vector, valid only for a one-text batch
    Single(Vec<f32>),
}

/// Normalize `output` into exactly `n` vectors of `dim`, index-aligned with
/// the input order.
pub fn align_batch(output: BatchOutput, n: usize, dim: usize) -> Result<Vec<Vec<f32>>> {
    let vectors = match output {
        BatchOutput::PerText(rows) => {
            for (i, row) in rows.iter().enumerate() {
                if row.len() != dim {
                    return Err(Error::EmbeddingShape(format!(
                        "vector {i} has dimension {}, expected {dim}",
                        row.len()
                    )));
                }
            }
            rows
        }
        BatchOutput::Batched { batch, data } => {
            if batch != n {
                return Err(Error::EmbeddingShape(format!(
                    "batch dimension {batch} does not match input count {n}"
                )));
            }
            if data.len() != batch * dim {
                return Err(Error::EmbeddingShape(format!(
                    "buffer of {} values cannot be split into {batch} x {dim}",
                    data.len()
                )));
            }
            data.chunks_exact(dim).map(|run| run.to_vec()).collect()
        }
        BatchOutput::Single(vector) => {
            if n != 1 {
                return Err(Error::EmbeddingShape(format!(
                    "single vector returned for a batch of {n}"
                )));
            }
            if vector.len() != dim {
                return Err(Error::EmbeddingShape(format!(
                    "vector has dimension {}, expected {dim}",
                    vector.len()
                )));
            }
            vec![vector]
        }
    };

    if vectors.len() != n {
        return Err(Error::EmbeddingShape(format!(
            "got {} vectors for {n} inputs",
            vectors.len()
        )));
    }

    Ok(vectors)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_text_shape() {
        let output = BatchOutput::PerText(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let aligned = align_batch(output, 2, 2).unwrap();
        assert_eq!(aligned, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
    }

    #[test]
    fn test_batched_shape_slices_in_input_order() {
        let output = BatchOutput::Batched {
            batch: 3,
            data: vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
        };
        let aligned = align_batch(output, 3, 2).unwrap();
        assert_eq!(aligned, vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]);
    }

    #[test]
    fn test_single_shape_for_one_input() {
        let output = BatchOutput::Single(vec![0.5, 0.5]);
        let aligned = align_batch(output, 1, 2).unwrap();
        assert_eq!(aligned, vec![vec![0.5, 0.5]]);
    }

    #[test]
    fn test_count_mismatch_is_fatal() {
        let output = BatchOutput::PerText(vec![vec![1.0, 0.0]]);
        assert!(matches!(
            align_batch(output, 2, 2),
            Err(Error::EmbeddingShape(_))
        ));

        let output = BatchOutput::Batched {
            batch: 2,
            data: vec![0.0; 4],
        };
        assert!(matches!(
            align_batch(output, 3, 2),
            Err(Error::EmbeddingShape(_))
        ));
    }

    #[test]
    fn test_single_rejected_for_real_batches() {
        let output = BatchOutput::Single(vec![0.0, 0.0]);
        assert!(matches!(
            align_batch(output, 2, 2),
            Err(Error::EmbeddingShape(_))
        ));
    }

    #[test]
    fn test_wrong_dimension_rejected() {
        let output = BatchOutput::PerText(vec![vec![0.0; 3]]);
        assert!(align_batch(output, 1, 2).is_err());

        let output = BatchOutput::Batched {
            batch: 2,
            data: vec![0.0; 5],
        };
        assert!(align_batch(output, 2, 2).is_err());
    }
}
