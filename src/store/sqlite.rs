//! SQLite-backed reference [`VectorStore`].
//!
//! Dense vectors are stored as little-endian `f32` BLOBs, sparse vectors
//! and payloads as JSON text; queries are answered by loading every row
//! in a collection and scoring it in memory, the same linear-scan
//! approach this crate's teacher used for its semantic search path
//! before any HNSW acceleration layer.

use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::Connection;
use serde_json::Value;

use super::{Distance, PayloadFilter, Point, ScoredPoint, StoreStats, VectorStore};
use crate::embed::cosine_similarity;
use crate::error::{Result, StoreError};
use crate::sparse::sparse_cosine_similarity;
use crate::types::{DenseVector, SparseVector};

/// SQLite-backed [`VectorStore`].
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

fn encode_dense(v: &DenseVector) -> Vec<u8> {
    v.iter().flat_map(|f| f.to_le_bytes()).collect()
}

fn decode_dense(bytes: &[u8]) -> DenseVector {
    bytes.chunks_exact(4).map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])).collect()
}

impl SqliteStore {
    /// Opens (creating if necessary) a SQLite database at `path`.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path).map_err(StoreError::Sqlite)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS points (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                dense BLOB NOT NULL,
                sparse TEXT NOT NULL,
                payload TEXT NOT NULL,
                PRIMARY KEY (collection, id)
            );",
        )
        .map_err(StoreError::Sqlite)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// Opens an in-memory SQLite database, useful for tests that need a
    /// real `rusqlite` backend without touching disk.
    pub fn in_memory() -> Result<Self> {
        Self::open(":memory:")
    }
}

#[async_trait]
impl VectorStore for SqliteStore {
    async fn create_collection(&self, _collection: &str, _dimensions: usize, _distance: Distance) -> Result<()> {
        // The `points` table is shared across collections; nothing to do
        // beyond the migration run at open time.
        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<Point>) -> Result<()> {
        let conn = self.conn.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        for point in points {
            let sparse_json = serde_json::to_string(&point.sparse).map_err(StoreError::Serde)?;
            let payload_json = serde_json::to_string(&point.payload).map_err(StoreError::Serde)?;
            conn.execute(
                "INSERT INTO points (collection, id, dense, sparse, payload) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(collection, id) DO UPDATE SET dense = excluded.dense, sparse = excluded.sparse, payload = excluded.payload",
                rusqlite::params![collection, point.id, encode_dense(&point.dense), sparse_json, payload_json],
            )
            .map_err(StoreError::Sqlite)?;
        }
        Ok(())
    }

    async fn query_dense(&self, collection: &str, query: &DenseVector, limit: usize) -> Result<Vec<ScoredPoint>> {
        let conn = self.conn.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut stmt = conn
            .prepare("SELECT id, dense, payload FROM points WHERE collection = ?1")
            .map_err(StoreError::Sqlite)?;
        let rows = stmt
            .query_map(rusqlite::params![collection], |row| {
                let id: String = row.get(0)?;
                let dense: Vec<u8> = row.get(1)?;
                let payload: String = row.get(2)?;
                Ok((id, dense, payload))
            })
            .map_err(StoreError::Sqlite)?;

        let mut scored = Vec::new();
        for row in rows {
            let (id, dense, payload) = row.map_err(StoreError::Sqlite)?;
            let payload: Value = serde_json::from_str(&payload).map_err(StoreError::Serde)?;
            let score = cosine_similarity(query, &decode_dense(&dense));
            scored.push(ScoredPoint { id, score, payload });
        }
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn query_sparse(&self, collection: &str, query: &SparseVector, limit: usize) -> Result<Vec<ScoredPoint>> {
        let conn = self.conn.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut stmt = conn
            .prepare("SELECT id, sparse, payload FROM points WHERE collection = ?1")
            .map_err(StoreError::Sqlite)?;
        let rows = stmt
            .query_map(rusqlite::params![collection], |row| {
                let id: String = row.get(0)?;
                let sparse: String = row.get(1)?;
                let payload: String = row.get(2)?;
                Ok((id, sparse, payload))
            })
            .map_err(StoreError::Sqlite)?;

        let mut scored = Vec::new();
        for row in rows {
            let (id, sparse, payload) = row.map_err(StoreError::Sqlite)?;
            let sparse: SparseVector = serde_json::from_str(&sparse).map_err(StoreError::Serde)?;
            let payload: Value = serde_json::from_str(&payload).map_err(StoreError::Serde)?;
            let score = sparse_cosine_similarity(query, &sparse);
            scored.push(ScoredPoint { id, score, payload });
        }
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn delete_by_filter(&self, collection: &str, filter: &PayloadFilter) -> Result<u64> {
        let conn = self.conn.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut stmt = conn
            .prepare("SELECT id, payload FROM points WHERE collection = ?1")
            .map_err(StoreError::Sqlite)?;
        let rows = stmt
            .query_map(rusqlite::params![collection], |row| {
                let id: String = row.get(0)?;
                let payload: String = row.get(1)?;
                Ok((id, payload))
            })
            .map_err(StoreError::Sqlite)?;

        let mut to_delete = Vec::new();
        for row in rows {
            let (id, payload) = row.map_err(StoreError::Sqlite)?;
            let payload: Value = serde_json::from_str(&payload).map_err(StoreError::Serde)?;
            if payload.get(&filter.field) == Some(&filter.value) {
                to_delete.push(id);
            }
        }
        for id in &to_delete {
            conn.execute(
                "DELETE FROM points WHERE collection = ?1 AND id = ?2",
                rusqlite::params![collection, id],
            )
            .map_err(StoreError::Sqlite)?;
        }
        Ok(to_delete.len() as u64)
    }

    async fn stats(&self, collection: &str) -> Result<StoreStats> {
        let conn = self.conn.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let points_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM points WHERE collection = ?1",
                rusqlite::params![collection],
                |row| row.get(0),
            )
            .map_err(StoreError::Sqlite)?;
        Ok(StoreStats { points_count: points_count as u64 })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn point(id: &str, dense: Vec<f32>, path: &str) -> Point {
        Point { id: id.to_string(), dense, sparse: Vec::new(), payload: json!({"path": path}) }
    }

    #[tokio::test]
    async fn roundtrips_dense_vector_through_blob_encoding() {
        let store = SqliteStore::in_memory().unwrap();
        store.create_collection("c", 2, Distance::Cosine).await.unwrap();
        store.upsert("c", vec![point("a", vec![0.5, 0.5], "a.rs")]).await.unwrap();

        let results = store.query_dense("c", &vec![0.5, 0.5], 1).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 1.0).abs() < 1e-4);
    }

    #[tokio::test]
    async fn upsert_replaces_existing_point() {
        let store = SqliteStore::in_memory().unwrap();
        store.create_collection("c", 2, Distance::Cosine).await.unwrap();
        store.upsert("c", vec![point("a", vec![1.0, 0.0], "a.rs")]).await.unwrap();
        store.upsert("c", vec![point("a", vec![0.0, 1.0], "a.rs")]).await.unwrap();
        assert_eq!(store.stats("c").await.unwrap().points_count, 1);
    }

    #[tokio::test]
    async fn delete_by_filter_removes_matching_rows() {
        let store = SqliteStore::in_memory().unwrap();
        store.create_collection("c", 2, Distance::Cosine).await.unwrap();
        store
            .upsert("c", vec![point("a", vec![1.0, 0.0], "a.rs"), point("b", vec![0.0, 1.0], "b.rs")])
            .await
            .unwrap();
        let removed = store
            .delete_by_filter("c", &PayloadFilter { field: "path".into(), value: json!("a.rs") })
            .await
            .unwrap();
        assert_eq!(removed, 1);
    }
}
