//! Error taxonomy for the engine.
//!
//! Mirrors the shape used throughout this crate: a top-level [`Error`]
//! enum wraps one error enum per subsystem, each with a `#[from]`
//! conversion so `?` composes across module boundaries without manual
//! mapping at every call site.

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type returned by fallible public APIs.
#[derive(Debug, Error)]
pub enum Error {
    /// Chunking failed.
    #[error(transparent)]
    Chunk(#[from] ChunkError),

    /// A vector store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An embedder operation failed.
    #[error(transparent)]
    Embed(#[from] EmbedError),

    /// The reasoning/dispatch loop failed in a way that could not be
    /// degraded into a lower-confidence answer.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Configuration could not be resolved.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An I/O operation failed outside the above subsystems.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A caller supplied an argument that violates a documented
    /// precondition.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Errors raised while splitting source text into chunks.
#[derive(Debug, Error)]
pub enum ChunkError {
    /// No grammar/boundary detector is registered for the file's language.
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The text could not be parsed into chunk boundaries.
    #[error("parse error in {path}: {reason}")]
    ParseError {
        /// Path of the file that failed to parse.
        path: String,
        /// Human-readable cause.
        reason: String,
    },

    /// A chunking parameter violates its own constraints (e.g. overlap
    /// larger than the chunk it overlaps).
    #[error("invalid chunk configuration: {reason}")]
    InvalidConfig {
        /// Description of the violated constraint.
        reason: String,
    },
}

/// Errors raised by a [`crate::store::VectorStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or is not accepting requests.
    #[error("vector store unavailable: {0}")]
    Unavailable(String),

    /// The requested collection does not exist.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// A query or upsert was rejected by the store.
    #[error("store rejected request: {0}")]
    Rejected(String),

    /// The underlying SQLite reference store hit a database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Payload (de)serialization failed.
    #[error("payload serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errors raised by a [`crate::embed::Embedder`] implementation.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// The embedding backend could not be reached.
    #[error("embedder unavailable: {0}")]
    Unavailable(String),

    /// The backend returned a vector of the wrong dimensionality.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimensionality the cache/store was configured for.
        expected: usize,
        /// Dimensionality actually returned.
        actual: usize,
    },
}

/// Errors raised by the reasoning/dispatch loop.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The reasoning model could not be reached or returned malformed output.
    #[error("reasoning model error: {0}")]
    ModelError(String),

    /// The token budget was exhausted before an answer could be produced.
    #[error("token budget exhausted: used {used}, budget {budget}")]
    BudgetExhausted {
        /// Tokens already charged against the budget.
        used: u64,
        /// The configured budget.
        budget: u64,
    },

    /// The wall-clock deadline for a dispatch elapsed before completion.
    #[error("timeout exceeded after {0:?}")]
    TimeoutExceeded(std::time::Duration),

    /// Retrieval failed in a way that could not be degraded gracefully.
    #[error("retrieval error: {0}")]
    RetrievalError(String),

    /// A validation check on intermediate state failed.
    #[error("validation error: {0}")]
    ValidationError(String),
}

/// Errors raised while resolving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable held a value that could not be parsed.
    #[error("invalid value for {var}: {reason}")]
    InvalidValue {
        /// Name of the offending environment variable.
        var: String,
        /// Why the value was rejected.
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_error_display() {
        assert_eq!(
            ChunkError::UnsupportedLanguage("cobol".into()).to_string(),
            "unsupported language: cobol"
        );
        assert_eq!(
            ChunkError::ParseError {
                path: "a.rs".into(),
                reason: "eof".into()
            }
            .to_string(),
            "parse error in a.rs: eof"
        );
        assert_eq!(
            ChunkError::InvalidConfig {
                reason: "overlap >= size".into()
            }
            .to_string(),
            "invalid chunk configuration: overlap >= size"
        );
    }

    #[test]
    fn store_error_display() {
        assert_eq!(
            StoreError::Unavailable("connection refused".into()).to_string(),
            "vector store unavailable: connection refused"
        );
        assert_eq!(
            StoreError::CollectionNotFound("chunks".into()).to_string(),
            "collection not found: chunks"
        );
    }

    #[test]
    fn embed_error_display() {
        assert_eq!(
            EmbedError::DimensionMismatch {
                expected: 768,
                actual: 384
            }
            .to_string(),
            "dimension mismatch: expected 768, got 384"
        );
    }

    #[test]
    fn engine_error_display() {
        assert_eq!(
            EngineError::BudgetExhausted {
                used: 100,
                budget: 80
            }
            .to_string(),
            "token budget exhausted: used 100, budget 80"
        );
    }

    #[test]
    fn error_from_conversions_compose() {
        let e: Error = ChunkError::UnsupportedLanguage("x".into()).into();
        assert!(matches!(e, Error::Chunk(_)));
        let e: Error = EngineError::RetrievalError("no results".into()).into();
        assert!(matches!(e, Error::Engine(_)));
    }
}
