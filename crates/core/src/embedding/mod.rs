//! Embedding contract.
//!
//! An [`Embedder`] turns text into a fixed-dimension vector. Implementations
//! are synchronous and may be CPU-heavy; the server runs them on a bounded
//! worker pool.

/// Deterministic FNV-1a feature-hashing embedder.
pub mod hash;
/// all-MiniLM-L6-v2 sentence encoder on candle.
#[cfg(feature = "minilm")]
pub mod minilm;

pub use hash::HashEmbedder;
#[cfg(feature = "minilm")]
pub use minilm::MiniLmEmbedder;

use std::time::Duration;

/// Failure to produce an embedding for a text.
#[derive(Debug, thiserror::Error)]
pub enum EncodingError {
    #[error("cannot embed empty text")]
    EmptyInput,
    #[error("embedding has {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("embedding contains NaN or Inf")]
    NonFinite,
    #[error("embedding timed out after {0:?}")]
    Timeout(Duration),
    #[error("embedding model failed to load: {0}")]
    ModelLoad(String),
    #[error("embedding worker failed: {0}")]
    Worker(String),
    #[error("embedding model inference failed: {0}")]
    Inference(String),
}

/// Text-to-vector encoder with a fixed output dimension.
///
/// Implementations must be deterministic: identical input yields an identical vector.
pub trait Embedder: Send + Sync {
    /// Output dimension, constant for the lifetime of the embedder.
    fn dimension(&self) -> usize;

    /// Encodes `text`. Blocking.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EncodingError>;
}

/// Checks an embedding's dimension and rejects NaN/Inf components.
pub fn validate_embedding(embedding: &[f32], expected: usize) -> Result<(), EncodingError> {
    if embedding.len() != expected {
        return Err(EncodingError::DimensionMismatch {
            expected,
            actual: embedding.len(),
        });
    }
    if embedding.iter().any(|v| !v.is_finite()) {
        return Err(EncodingError::NonFinite);
    }
    Ok(())
}
