//! Engine configuration.
//!
//! Settings resolve in the same order the CLI layer resolves them
//! elsewhere in this crate: an explicit value wins, then the matching
//! environment variable, then a hardcoded default.

use std::env;
use std::time::Duration;

/// Tunables for a single [`crate::dispatch::Dispatcher`] run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Connection string for the vector store (`STORE_URL`).
    pub store_url: String,
    /// Connection string for the embedding backend (`EMBEDDER_URL`).
    pub embedder_url: String,
    /// Name of the collection chunks are indexed into (`COLLECTION`).
    pub collection: String,
    /// Directory to load tree-sitter-style grammars from (`GRAMMARS_DIR`).
    pub grammars_dir: Option<String>,
    /// Maximum recursion depth for `sub_query` tool calls.
    pub max_depth: u32,
    /// Token budget charged against model responses during a dispatch.
    pub token_budget: u64,
    /// Maximum number of dispatcher refinement iterations.
    pub max_recursions: u32,
    /// Confidence below which evidence is treated as a coverage gap.
    pub min_evidence_confidence: f64,
    /// Overall confidence at or above which a result is `confident`.
    pub confidence_threshold: f64,
    /// Wall-clock budget for a single dispatch.
    pub timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_url: "sqlite://coderag.db".to_string(),
            embedder_url: "local://fallback".to_string(),
            collection: "rlm_chunks".to_string(),
            grammars_dir: None,
            max_depth: 3,
            token_budget: 50_000,
            max_recursions: 3,
            min_evidence_confidence: 0.4,
            confidence_threshold: 0.7,
            timeout: Duration::from_secs(60),
        }
    }
}

impl EngineConfig {
    /// Builds a config from environment variables, falling back to
    /// [`EngineConfig::default`] for anything unset.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            store_url: env::var("STORE_URL").unwrap_or(defaults.store_url),
            embedder_url: env::var("EMBEDDER_URL").unwrap_or(defaults.embedder_url),
            collection: env::var("COLLECTION").unwrap_or(defaults.collection),
            grammars_dir: env::var("GRAMMARS_DIR").ok(),
            ..defaults
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_collection_matches_wire_default() {
        assert_eq!(EngineConfig::default().collection, "rlm_chunks");
    }

    #[test]
    fn default_confidence_threshold_is_seventy_percent() {
        assert!((EngineConfig::default().confidence_threshold - 0.7).abs() < f64::EPSILON);
    }
}
