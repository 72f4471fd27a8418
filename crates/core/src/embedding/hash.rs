//! FNV-1a feature-hashing embedder.
//!
//! Each token (and each character trigram of a token) is hashed into one of
//! `dimension` signed buckets; the resulting vector is L2-normalized. Texts that
//! share vocabulary land close together under cosine similarity. No model files,
//! fully deterministic, suitable as a default and for tests.

use crate::bm25::tokenizer::tokenize;
use crate::embedding::{EncodingError, Embedder};
use crate::search::similarity::normalize;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

const TOKEN_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Deterministic hashing embedder with a configurable dimension.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    dimension: usize,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn accumulate(&self, out: &mut [f32], feature: &[u8], weight: f32) {
        let hash = fnv1a(feature);
        let bucket = (hash % self.dimension as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        out[bucket] += sign * weight;
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_EMBEDDING_DIMENSION)
    }
}

impl Embedder for HashEmbedder {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, EncodingError> {
        if text.trim().is_empty() {
            return Err(EncodingError::EmptyInput);
        }

        let mut out = vec![0.0f32; self.dimension];
        let tokens = tokenize(text);
        for token in tokens.iter() {
            self.accumulate(&mut out, token.as_bytes(), TOKEN_WEIGHT);

            let chars: Vec<char> = token.chars().collect();
            if chars.len() > 3 {
                let mut buf = String::with_capacity(12);
                for window in chars.windows(3) {
                    buf.clear();
                    buf.extend(window);
                    self.accumulate(&mut out, buf.as_bytes(), TRIGRAM_WEIGHT);
                }
            }
        }
        normalize(&mut out);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::similarity::cosine_similarity;

    #[test]
    fn test_fixed_dimension_and_unit_norm() {
        let embedder = HashEmbedder::new(64);
        let v = embedder.embed("renewable energy storage").unwrap();
        assert_eq!(v.len(), 64);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_deterministic() {
        let embedder = HashEmbedder::default();
        assert_eq!(
            embedder.embed("unit tests").unwrap(),
            embedder.embed("unit tests").unwrap()
        );
    }

    #[test]
    fn test_empty_input_rejected() {
        let embedder = HashEmbedder::default();
        assert!(matches!(embedder.embed(""), Err(EncodingError::EmptyInput)));
        assert!(matches!(embedder.embed("  \t"), Err(EncodingError::EmptyInput)));
    }

    #[test]
    fn test_shared_vocabulary_is_closer() {
        let embedder = HashEmbedder::default();
        let query = embedder.embed("energy storage batteries").unwrap();
        let related = embedder
            .embed("Batteries and pumped hydro are common methods of energy storage.")
            .unwrap();
        let unrelated = embedder
            .embed("Avoid render-blocking resources to enhance web page speed.")
            .unwrap();
        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[test]
    fn test_stop_words_only_is_zero_vector() {
        let embedder = HashEmbedder::new(16);
        let v = embedder.embed("the of and").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }
}
