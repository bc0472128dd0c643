//! In-process reference [`VectorStore`], used by most of this crate's
//! tests. Holds every point in memory and answers queries with a linear
//! scan — fine for the small corpora exercised in tests, not intended
//! for production-sized indexes.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{Distance, PayloadFilter, Point, ScoredPoint, StoreStats, VectorStore};
use crate::embed::cosine_similarity;
use crate::error::Result;
use crate::sparse::sparse_cosine_similarity;
use crate::types::{DenseVector, SparseVector};

/// In-memory [`VectorStore`] backed by a `HashMap` per collection.
#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, HashMap<String, Point>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn top_n(mut scored: Vec<ScoredPoint>, limit: usize) -> Vec<ScoredPoint> {
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn create_collection(&self, collection: &str, _dimensions: usize, _distance: Distance) -> Result<()> {
        let mut guard = self.collections.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        guard.entry(collection.to_string()).or_default();
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<Point>) -> Result<()> {
        let mut guard = self.collections.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let entry = guard.entry(collection.to_string()).or_default();
        for point in points {
            entry.insert(point.id.clone(), point);
        }
        Ok(())
    }

    async fn query_dense(&self, collection: &str, query: &DenseVector, limit: usize) -> Result<Vec<ScoredPoint>> {
        let guard = self.collections.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(points) = guard.get(collection) else { return Ok(Vec::new()) };
        let scored = points
            .values()
            .map(|p| ScoredPoint { id: p.id.clone(), score: cosine_similarity(query, &p.dense), payload: p.payload.clone() })
            .collect();
        Ok(Self::top_n(scored, limit))
    }

    async fn query_sparse(&self, collection: &str, query: &SparseVector, limit: usize) -> Result<Vec<ScoredPoint>> {
        let guard = self.collections.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(points) = guard.get(collection) else { return Ok(Vec::new()) };
        let scored = points
            .values()
            .map(|p| ScoredPoint { id: p.id.clone(), score: sparse_cosine_similarity(query, &p.sparse), payload: p.payload.clone() })
            .collect();
        Ok(Self::top_n(scored, limit))
    }

    async fn delete_by_filter(&self, collection: &str, filter: &PayloadFilter) -> Result<u64> {
        let mut guard = self.collections.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let Some(points) = guard.get_mut(collection) else { return Ok(0) };
        let before = points.len();
        points.retain(|_, p| p.payload.get(&filter.field) != Some(&filter.value));
        Ok((before - points.len()) as u64)
    }

    async fn stats(&self, collection: &str) -> Result<StoreStats> {
        let guard = self.collections.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let points_count = guard.get(collection).map_or(0, |p| p.len() as u64);
        Ok(StoreStats { points_count })
    }
}
