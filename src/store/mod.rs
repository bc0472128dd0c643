//! The vector store external collaborator.
//!
//! The engine depends on [`VectorStore`] rather than any specific
//! database. [`memory::MemoryStore`] is a reference implementation used
//! by most tests; [`sqlite::SqliteStore`] is a reference implementation
//! suitable for a real local deployment, grounded on the same
//! `rusqlite` usage this crate's reference embedder/indexer expect.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::{Chunk, DenseVector, SparseVector};

/// Distance metric a collection is created with. Only `Cosine` is used
/// by this crate's retriever, but the type documents the store's
/// contract the way a real vector database's API would.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distance {
    /// Cosine similarity.
    Cosine,
}

/// A chunk plus its vectors, as stored by a [`VectorStore`].
#[derive(Debug, Clone)]
pub struct Point {
    /// Matches [`Chunk::id`].
    pub id: String,
    /// Dense embedding of [`Chunk::text`].
    pub dense: DenseVector,
    /// Lexical sparse vector of [`Chunk::text`].
    pub sparse: SparseVector,
    /// The chunk's searchable/filterable metadata, stored as JSON so a
    /// real backend's payload filter can be expressed generically.
    pub payload: Value,
}

impl Point {
    /// Builds a [`Point`] from a chunk and its two vector
    /// representations, storing the chunk's metadata as the payload.
    #[must_use]
    pub fn from_chunk(chunk: &Chunk, dense: DenseVector, sparse: SparseVector) -> Self {
        let payload = serde_json::json!({
            "path": chunk.path,
            "language": chunk.language,
            "symbol_type": chunk.symbol_type,
            "symbol_name": chunk.symbol_name,
            "start_line": chunk.start_line,
            "end_line": chunk.end_line,
            "file_hash": chunk.file_hash,
            "text": chunk.text,
        });
        Self { id: chunk.id.clone(), dense, sparse, payload }
    }
}

/// A scored match returned from a dense or sparse query.
#[derive(Debug, Clone)]
pub struct ScoredPoint {
    /// Id of the matching point.
    pub id: String,
    /// Similarity score, higher is better.
    pub score: f64,
    /// The stored payload.
    pub payload: Value,
}

/// Aggregate counts for a collection.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreStats {
    /// Number of points currently stored.
    pub points_count: u64,
}

/// A payload filter: matches points whose payload has `field == value`.
#[derive(Debug, Clone)]
pub struct PayloadFilter {
    /// Payload field name.
    pub field: String,
    /// Value the field must equal.
    pub value: Value,
}

/// Storage and query interface for indexed chunks' vectors.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Creates `collection` with the given dense dimensionality and
    /// distance metric, if it does not already exist.
    async fn create_collection(&self, collection: &str, dimensions: usize, distance: Distance) -> Result<()>;

    /// Inserts or replaces points by id.
    async fn upsert(&self, collection: &str, points: Vec<Point>) -> Result<()>;

    /// Finds the `limit` points whose dense vector is most similar to `query`.
    async fn query_dense(&self, collection: &str, query: &DenseVector, limit: usize) -> Result<Vec<ScoredPoint>>;

    /// Finds the `limit` points whose sparse vector is most similar to `query`.
    async fn query_sparse(&self, collection: &str, query: &SparseVector, limit: usize) -> Result<Vec<ScoredPoint>>;

    /// Deletes every point whose payload matches `filter`.
    async fn delete_by_filter(&self, collection: &str, filter: &PayloadFilter) -> Result<u64>;

    /// Returns aggregate stats for `collection`.
    async fn stats(&self, collection: &str) -> Result<StoreStats>;
}
