//! ONNX-backed [`Embedder`] using `fastembed`, enabled by the
//! `fastembed-embeddings` feature. Ships alongside [`super::fallback`]
//! as a real embedding backend for operators who want better retrieval
//! quality than the hash-based default at the cost of a model download.

use std::sync::Mutex;

use async_trait::async_trait;
use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::Embedder;
use crate::error::{EmbedError, Result};
use crate::types::DenseVector;

/// Embedder backed by a local ONNX model via `fastembed`.
pub struct FastEmbedEmbedder {
    model: Mutex<TextEmbedding>,
    dimensions: usize,
}

impl FastEmbedEmbedder {
    /// Loads the default `fastembed` model, downloading weights on
    /// first use if necessary.
    pub fn new() -> Result<Self> {
        let model = TextEmbedding::try_new(
            InitOptions::new(EmbeddingModel::BGESmallENV15).with_show_download_progress(false),
        )
        .map_err(|e| EmbedError::Unavailable(e.to_string()))?;
        Ok(Self { model: Mutex::new(model), dimensions: 384 })
    }
}

#[async_trait]
impl Embedder for FastEmbedEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> Result<DenseVector> {
        let text = text.to_string();
        let dimensions = self.dimensions;
        let model = self.model.lock().map_err(|_| EmbedError::Unavailable("model lock poisoned".into()))?;
        let mut out = model
            .embed(vec![text], None)
            .map_err(|e| EmbedError::Unavailable(e.to_string()))?;
        let vector = out.pop().ok_or_else(|| EmbedError::Unavailable("empty embedding result".into()))?;
        if vector.len() != dimensions {
            return Err(EmbedError::DimensionMismatch { expected: dimensions, actual: vector.len() }.into());
        }
        Ok(vector)
    }
}
