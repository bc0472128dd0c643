//! The embedder external collaborator.
//!
//! The engine depends on [`Embedder`] rather than any specific backend.
//! [`fallback::FallbackEmbedder`] is the crate's deterministic reference
//! implementation, used by tests and by default when `EMBEDDER_URL`
//! points nowhere real; the `fastembed-embeddings` feature adds an
//! ONNX-backed alternative.

pub mod cache;
pub mod fallback;
#[cfg(feature = "fastembed-embeddings")]
pub mod fastembed_impl;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::DenseVector;

/// Default embedding dimensionality when a backend does not specify one.
pub const DEFAULT_DIMENSIONS: usize = 768;

/// Produces dense embeddings for text.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Dimensionality of vectors this embedder produces.
    fn dimensions(&self) -> usize;

    /// Embeds a single piece of text.
    async fn embed(&self, text: &str) -> Result<DenseVector>;

    /// Embeds a batch of texts. The default implementation calls
    /// [`Embedder::embed`] sequentially; backends with a native batch
    /// API should override this.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<DenseVector>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }
}

/// Cosine similarity between two dense vectors. Returns `0.0` for
/// mismatched lengths or a zero-magnitude vector rather than erroring,
/// since callers use this for ranking, not correctness-critical math.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f64 = a.iter().zip(b).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a: f64 = a.iter().map(|x| f64::from(*x) * f64::from(*x)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| f64::from(*x) * f64::from(*x)).sum::<f64>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_identical_vectors_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_similarity_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn cosine_similarity_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    }
}
