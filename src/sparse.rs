//! Deterministic lexical sparse vectors.
//!
//! Both the indexer (when it upserts a chunk) and the retriever (when it
//! embeds a query) call [`lexical_sparse_vector`] so the two sides of a
//! sparse-vector comparison are always built by the same transform.

use std::collections::HashMap;

use crate::types::SparseVector;

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "is", "are", "was", "were", "be", "been", "being", "to", "of", "in", "on",
    "for", "with", "as", "by", "at", "from", "and", "or", "but", "it", "this", "that", "these",
    "those", "i", "you", "he", "she", "we", "they",
];

fn hash_term(term: &str) -> u32 {
    // FNV-1a, 32-bit: cheap, deterministic, no per-process seed.
    let mut hash: u32 = 0x811c_9dc5;
    for byte in term.bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(0x0100_0193);
    }
    hash
}

/// Tokenizes `text` into lowercase alphanumeric terms, dropping
/// stopwords and single-character tokens.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|s| s.len() > 1)
        .map(str::to_lowercase)
        .filter(|s| !STOPWORDS.contains(&s.as_str()))
        .collect()
}

/// Builds an L2-normalized, term-frequency sparse vector for `text`,
/// keyed by a 32-bit hash of each surviving term.
#[must_use]
pub fn lexical_sparse_vector(text: &str) -> SparseVector {
    let mut counts: HashMap<u32, f32> = HashMap::new();
    for term in tokenize(text) {
        *counts.entry(hash_term(&term)).or_insert(0.0) += 1.0;
    }

    let norm = counts.values().map(|v| v * v).sum::<f32>().sqrt();
    let mut vec: SparseVector = if norm > 0.0 {
        counts.into_iter().map(|(k, v)| (k, v / norm)).collect()
    } else {
        Vec::new()
    };
    vec.sort_by_key(|(term, _)| *term);
    vec
}

/// Cosine similarity between two sparse vectors, both assumed sorted by
/// term id ascending (as produced by [`lexical_sparse_vector`]).
#[must_use]
pub fn sparse_cosine_similarity(a: &SparseVector, b: &SparseVector) -> f64 {
    let (mut i, mut j) = (0, 0);
    let mut dot = 0.0f64;
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Equal => {
                dot += f64::from(a[i].1) * f64::from(b[j].1);
                i += 1;
                j += 1;
            }
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
        }
    }
    dot
}
