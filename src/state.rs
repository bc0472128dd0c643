//! Mutable state threaded through a single dispatch.
//!
//! Grounded on the REPL-style context container this crate's reasoning
//! tools operate on: a typed variable store plus the accumulating
//! working set of chunks, evidence, and reasoning trace for the
//! question currently being answered.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::types::{ContextChunk, Evidence};

/// An opaque value a reasoning tool can stash under a name and later
/// retrieve, mirroring the tagged-variant variable store this crate's
/// REPL context used before recursive tool calls replaced direct
/// variable manipulation as the primary interaction mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum ContextValue {
    /// A string value.
    String(String),
    /// An integer value.
    Integer(i64),
    /// A floating point value.
    Float(f64),
    /// A boolean value.
    Boolean(bool),
    /// A list of values.
    List(Vec<ContextValue>),
    /// The absence of a value.
    Null,
}

/// Working state for one dispatch: the accumulated context chunks,
/// extracted evidence, reasoning trace, and resource accounting.
#[derive(Debug, Clone, Default)]
pub struct State {
    /// Named scratch values set by reasoning tools.
    pub variables: HashMap<String, ContextValue>,
    /// Chunks pulled into context so far, in insertion order.
    pub chunks: Vec<ContextChunk>,
    /// Evidence gathered so far.
    pub evidence: Vec<Evidence>,
    /// Free-text trace of the reasoning model's intermediate steps.
    pub reasoning: Vec<String>,
    /// Current recursion depth (0 at the top-level query).
    pub depth: u32,
    /// Tokens charged against the budget so far.
    pub tokens_used: u64,
}

impl State {
    /// Creates an empty state at depth 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maximum number of matches [`State::search_context`] returns,
    /// regardless of how many lines actually match.
    pub const SEARCH_RESULT_CAP: usize = 20;

    /// Whether another level of `sub_query` recursion is allowed given
    /// `max_depth`.
    #[must_use]
    pub fn can_recurse(&self, max_depth: u32) -> bool {
        self.depth < max_depth
    }

    /// One line per chunk, not its text: `[id] path:start-end (symbol, score)`.
    /// The model must use `peek_context`/`get_chunk`/`search_context` to read
    /// actual content; this index exists so it can choose what to read.
    #[must_use]
    pub fn get_context_summary(&self) -> String {
        self.chunks
            .iter()
            .map(|c| {
                format!(
                    "[{}] {}:{}-{} ({}, {:.2})",
                    c.chunk.id, c.chunk.path, c.chunk.start_line, c.chunk.end_line, c.chunk.symbol_name, c.relevance
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Concatenates every chunk's text with a `--- id (path) ---`
    /// separator line before each, and returns lines `[start, end]`
    /// (1-indexed, inclusive) from that concatenation, numbering lines
    /// globally across the whole thing, separators included.
    #[must_use]
    pub fn get_context_lines(&self, start: u32, end: u32) -> Vec<String> {
        let mut all_lines: Vec<String> = Vec::new();
        for ctx_chunk in &self.chunks {
            all_lines.push(format!("--- {} ({}) ---", ctx_chunk.chunk.id, ctx_chunk.chunk.path));
            all_lines.extend(ctx_chunk.chunk.text.lines().map(str::to_string));
        }
        let start_idx = start.saturating_sub(1) as usize;
        let end_idx = (end as usize).min(all_lines.len());
        if start_idx >= end_idx {
            return Vec::new();
        }
        all_lines[start_idx..end_idx].to_vec()
    }

    /// Returns `(chunk_id, line_within_chunk, matched_line)` for up to
    /// [`State::SEARCH_RESULT_CAP`] lines across all chunks matching
    /// `pattern`, case-insensitively.
    pub fn search_context(&self, pattern: &str) -> Vec<(String, u32, String)> {
        let Ok(re) = Regex::new(&format!("(?i){pattern}")) else { return Vec::new() };
        let mut matches = Vec::new();
        'outer: for ctx_chunk in &self.chunks {
            for (i, line) in ctx_chunk.chunk.text.lines().enumerate() {
                if re.is_match(line) {
                    matches.push((ctx_chunk.chunk.id.clone(), i as u32 + 1, line.to_string()));
                    if matches.len() >= Self::SEARCH_RESULT_CAP {
                        break 'outer;
                    }
                }
            }
        }
        matches
    }

    /// Charges `tokens` against the running total, returning the new total.
    pub fn charge_tokens(&mut self, tokens: u64) -> u64 {
        self.tokens_used += tokens;
        self.tokens_used
    }
}
