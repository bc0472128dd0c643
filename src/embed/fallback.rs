//! Deterministic, hash-based embedder.
//!
//! Produces a vector by hashing overlapping shingles of the input into
//! buckets, the way a fast, dependency-free stand-in for a real neural
//! embedder does: no network calls, no model weights, but similar
//! strings still land close together because they share shingles.

use async_trait::async_trait;

use super::{DEFAULT_DIMENSIONS, Embedder};
use crate::error::Result;
use crate::types::DenseVector;

/// Deterministic embedder used when no real backend is configured.
#[derive(Debug, Clone)]
pub struct FallbackEmbedder {
    dimensions: usize,
}

impl Default for FallbackEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIMENSIONS)
    }
}

impl FallbackEmbedder {
    /// Creates a fallback embedder that produces `dimensions`-length vectors.
    #[must_use]
    pub const fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_sync(&self, text: &str) -> DenseVector {
        let mut vector = vec![0.0f32; self.dimensions];
        let lower = text.to_lowercase();
        let bytes = lower.as_bytes();
        if bytes.is_empty() {
            return vector;
        }

        const SHINGLE: usize = 3;
        let len = bytes.len();
        let shingles: Box<dyn Iterator<Item = &[u8]>> = if len >= SHINGLE {
            Box::new((0..=len - SHINGLE).map(move |i| &bytes[i..i + SHINGLE]))
        } else {
            Box::new(std::iter::once(bytes))
        };

        for shingle in shingles {
            let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
            for &b in shingle {
                hash ^= u64::from(b);
                hash = hash.wrapping_mul(0x0000_0100_0000_01B3);
            }
            let bucket = (hash as usize) % self.dimensions;
            let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for FallbackEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<DenseVector> {
        Ok(self.embed_sync(text))
    }
}
