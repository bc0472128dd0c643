//! Hybrid retrieval: dense + sparse search fused by RRF.

pub mod rrf;

use std::collections::HashMap;
use std::sync::Arc;

use rrf::{RrfConfig, reciprocal_rank_fusion};
use serde_json::Value;

use crate::embed::Embedder;
use crate::error::Result;
use crate::sparse::lexical_sparse_vector;
use crate::store::VectorStore;
use crate::types::Chunk;

/// Tunables for a [`hybrid_search`] call.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Number of fused results to return.
    pub top_k: usize,
    /// Candidate pool size requested from each of the dense/sparse legs
    /// before fusion, typically larger than `top_k`.
    pub candidate_pool: usize,
    /// RRF tuning.
    pub rrf: RrfConfig,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { top_k: 10, candidate_pool: 50, rrf: RrfConfig::default() }
    }
}

/// One fused retrieval result.
#[derive(Debug, Clone)]
pub struct SearchResult {
    /// The retrieved chunk, reconstructed from the store's payload.
    pub chunk: Chunk,
    /// Fused RRF score.
    pub score: f64,
}

fn chunk_from_payload(id: &str, payload: &Value) -> Option<Chunk> {
    Some(Chunk {
        id: id.to_string(),
        path: payload.get("path")?.as_str()?.to_string(),
        language: payload.get("language")?.as_str()?.to_string(),
        symbol_type: payload.get("symbol_type")?.as_str()?.to_string(),
        symbol_name: payload.get("symbol_name")?.as_str()?.to_string(),
        start_line: u32::try_from(payload.get("start_line")?.as_u64()?).ok()?,
        end_line: u32::try_from(payload.get("end_line")?.as_u64()?).ok()?,
        file_hash: payload.get("file_hash")?.as_str()?.to_string(),
        text: payload.get("text")?.as_str()?.to_string(),
    })
}

/// Runs a hybrid dense+sparse query against `collection` and returns
/// the top `config.top_k` fused results.
pub async fn hybrid_search(
    query: &str,
    collection: &str,
    embedder: &Arc<dyn Embedder>,
    store: &Arc<dyn VectorStore>,
    config: &SearchConfig,
) -> Result<Vec<SearchResult>> {
    let dense_query = embedder.embed(query).await?;
    let sparse_query = lexical_sparse_vector(query);

    let dense_hits = store.query_dense(collection, &dense_query, config.candidate_pool).await?;
    let sparse_hits = store.query_sparse(collection, &sparse_query, config.candidate_pool).await?;

    let mut payloads: HashMap<String, Value> = HashMap::new();
    for hit in &dense_hits {
        payloads.insert(hit.id.clone(), hit.payload.clone());
    }
    for hit in &sparse_hits {
        payloads.entry(hit.id.clone()).or_insert_with(|| hit.payload.clone());
    }

    let dense_ids: Vec<String> = dense_hits.into_iter().map(|h| h.id).collect();
    let sparse_ids: Vec<String> = sparse_hits.into_iter().map(|h| h.id).collect();
    let fused = reciprocal_rank_fusion(&[&dense_ids, &sparse_ids], config.rrf);

    let mut results = Vec::with_capacity(config.top_k);
    for (id, score) in fused.into_iter().take(config.top_k) {
        let Some(payload) = payloads.get(&id) else { continue };
        let Some(chunk) = chunk_from_payload(&id, payload) else { continue };
        results.push(SearchResult { chunk, score });
    }
    Ok(results)
}
