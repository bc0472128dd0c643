//! Shared data model.
//!
//! These types cross module boundaries (chunker → store → retriever →
//! engine → verifier → formatter) so they live in one place rather than
//! being re-declared per consumer, the way this crate's error enums are
//! centralized in [`crate::error`].

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A dense embedding vector.
pub type DenseVector = Vec<f32>;

/// A sparse lexical vector: term-hash to weight, L2-normalized.
///
/// Stored as a sorted `Vec` rather than a `HashMap` so two sparse vectors
/// built from the same text compare equal and serialize deterministically.
pub type SparseVector = Vec<(u32, f32)>;

/// One unit of indexed, retrievable text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Deterministic id: derived from `file_hash`, `start_line`, and
    /// `symbol_name`, with a numeric ordinal suffix to disambiguate
    /// siblings that share all three.
    pub id: String,
    /// Repository-relative file path.
    pub path: String,
    /// Detected source language, or `"prose"` for markdown/plain text.
    pub language: String,
    /// Kind of symbol the chunk represents (`"function"`, `"class"`,
    /// `"section"`, ...), empty string when not applicable.
    pub symbol_type: String,
    /// Name of the symbol, or `"<anonymous>"` when none could be
    /// extracted.
    pub symbol_name: String,
    /// 1-indexed, inclusive start line within `path`.
    pub start_line: u32,
    /// 1-indexed, inclusive end line within `path`.
    pub end_line: u32,
    /// Short content hash of the whole source file this chunk came from.
    pub file_hash: String,
    /// The chunk's text.
    pub text: String,
}

impl Chunk {
    /// Computes the short SHA-256 hex digest used for both `file_hash`
    /// values and chunk ids.
    #[must_use]
    pub fn short_hash(bytes: &[u8]) -> String {
        let digest = Sha256::digest(bytes);
        digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
    }

    /// Builds a chunk id from its identifying fields plus a disambiguating
    /// ordinal, so repeated calls with the same inputs and the same
    /// ordinal always produce the same id.
    #[must_use]
    pub fn make_id(file_hash: &str, start_line: u32, symbol_name: &str, ordinal: u32) -> String {
        let basis = format!("{file_hash}:{start_line}:{symbol_name}:{ordinal}");
        format!("chunk_{}", Self::short_hash(basis.as_bytes()))
    }

    /// Number of lines the chunk spans.
    #[must_use]
    pub const fn line_count(&self) -> u32 {
        self.end_line.saturating_sub(self.start_line) + 1
    }
}

/// Path to short-file-hash mapping the indexer uses to detect changed,
/// added, and removed files between runs.
pub type FileHashIndex = std::collections::HashMap<String, String>;

/// A chunk pulled into the working [`crate::state::State`], carrying the
/// retrieval score that put it there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextChunk {
    /// The underlying chunk.
    pub chunk: Chunk,
    /// Fused retrieval score (post-RRF), 0.0 when added without a search.
    pub relevance: f64,
}

/// A claim grounded (or not) in one or more chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtomicClaim {
    /// The claim's sentence text, as extracted.
    pub text: String,
    /// Whether the claim is a checkable factual assertion rather than an
    /// opinion, a question, or meta-commentary about the answer itself.
    pub verifiable: bool,
    /// The claim's sentence plus its immediate neighbors, for
    /// display/debugging when the bare sentence lacks context.
    pub context: String,
    /// Byte offset range of the claim's sentence within the answer text
    /// it was extracted from.
    pub source_position: (usize, usize),
    /// Ids of chunks judged relevant to the claim by keyword overlap.
    pub chunk_ids: Vec<String>,
}

/// Evidence linking a claim to the chunk text that supports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    /// The claim this evidence backs.
    pub claim: String,
    /// Chunk ids cited as support.
    pub source_chunk_ids: Vec<String>,
    /// Confidence in the link, `[0.0, 1.0]`.
    pub confidence: f64,
}

/// Coverage outcome for a single claim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Coverage {
    /// The claim has sufficiently confident supporting evidence.
    Covered,
    /// The claim lacks sufficient evidence, with a reason.
    Gap(String),
}

/// Output of the verifier for one dispatch iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Fraction of claims covered by evidence, `[0.0, 1.0]`.
    pub coverage_ratio: f64,
    /// Fraction of cited chunks sharing the dominant source path.
    pub consistency: f64,
    /// Final blended confidence, `[0.0, 1.0]`.
    pub overall_confidence: f64,
    /// Whether `overall_confidence` meets the configured threshold.
    pub confident: bool,
    /// Reasons claims were not covered, for refinement-hint generation.
    pub gap_reasons: Vec<String>,
    /// A reworded query to retry with, when not confident and gaps exist.
    pub suggested_refinement: Option<String>,
}

/// Qualitative bucket for a [`ConfidenceReport`]'s combined score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    /// Combined score below 0.4.
    Low,
    /// Combined score in `[0.4, 0.7)`.
    Medium,
    /// Combined score at or above 0.7.
    High,
}

impl ConfidenceLevel {
    /// Buckets a combined confidence score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score < 0.4 {
            Self::Low
        } else if score < 0.7 {
            Self::Medium
        } else {
            Self::High
        }
    }
}

/// A weighted blend of retrieval quality, evidence coverage, chunk
/// count, and source consistency for one dispatch iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceReport {
    /// Mean fused retrieval score of chunks pulled into context.
    pub retrieval_score: f64,
    /// Fraction of claims covered by evidence.
    pub evidence_coverage: f64,
    /// `min(chunk_count / 10, 1)`.
    pub chunk_saturation: f64,
    /// Fraction of cited chunks sharing the dominant path.
    pub consistency: f64,
    /// The weighted combination of the above.
    pub combined: f64,
    /// Qualitative bucket derived from `combined`.
    pub level: ConfidenceLevel,
    /// Human-readable notes about factors that fell below threshold, or
    /// about refinement being suppressed to avoid looping.
    pub warnings: Vec<String>,
}

/// The dispatcher's final, user-facing answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedResult {
    /// The synthesized natural-language answer.
    pub answer: String,
    /// Chunks cited in support of `answer`.
    pub evidence: Vec<Evidence>,
    /// Verification outcome for the iteration that produced `answer`.
    pub verification: VerificationResult,
    /// The confidence breakdown for the iteration that produced `answer`.
    pub confidence_report: ConfidenceReport,
    /// Free-text trace of tool invocations and model commentary.
    pub reasoning: Vec<String>,
    /// Tokens charged against the budget while producing `answer`.
    pub tokens_used: u64,
    /// Engine recursion depth observed at the end of that iteration.
    pub recursion_depth: u32,
    /// Number of refinement iterations the dispatcher performed.
    pub iterations: u32,
}
