//! Extracting atomic, checkable claims from a generated answer.

use std::sync::OnceLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

use crate::types::{AtomicClaim, Chunk};

/// Sentences trimmed shorter than this are dropped outright: too short
/// to carry a checkable assertion.
const MIN_CLAIM_LEN: usize = 10;

fn opinion_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::unwrap_used)]
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(think|believe|feel|suggest|recommend|might|could|should|probably|perhaps|maybe|in my opinion|i would say|it seems|arguably)\b",
        )
        .unwrap()
    })
}

fn meta_commentary_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    #[allow(clippy::unwrap_used)]
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(in summary|to summarize|as mentioned|to clarify|note that|as i said|as noted|as shown|as we can see|let me|i will|i can|i should|here is|here's|overall,)",
        )
        .unwrap()
    })
}

fn is_verifiable(sentence: &str) -> bool {
    if sentence.ends_with('?') {
        return false;
    }
    if opinion_pattern().is_match(sentence) {
        return false;
    }
    if meta_commentary_pattern().is_match(sentence) {
        return false;
    }
    true
}

fn keywords(text: &str) -> Vec<String> {
    text.unicode_words().map(str::to_lowercase).filter(|w| w.len() > 4).collect()
}

fn link_chunks(claim_keywords: &[String], chunks: &[Chunk]) -> Vec<String> {
    let mut chunk_ids = Vec::new();
    for chunk in chunks {
        let chunk_keywords = keywords(&chunk.text);
        let overlap = claim_keywords.iter().filter(|k| chunk_keywords.contains(k)).count();
        let ratio = if claim_keywords.is_empty() { 0.0 } else { overlap as f64 / claim_keywords.len() as f64 };
        if overlap >= 2 || ratio >= 0.5 {
            chunk_ids.push(chunk.id.clone());
        }
    }
    chunk_ids
}

/// Splits `answer` into sentences, drops sentences trimmed shorter than
/// [`MIN_CLAIM_LEN`], and links each surviving sentence to any `chunks`
/// it shares two-or-more keywords with (or at least half its keywords,
/// for very short claims). Sentences that are questions, or match an
/// opinion or meta-commentary pattern, are kept but marked
/// `verifiable = false` rather than dropped, so [`filter_verifiable`]
/// can be applied separately.
#[must_use]
pub fn extract_claims(answer: &str, chunks: &[Chunk]) -> Vec<AtomicClaim> {
    let mut sentences: Vec<(usize, usize, &str)> = Vec::new();
    let mut offset = 0usize;
    for sentence in answer.unicode_sentences() {
        let start = offset;
        let end = start + sentence.len();
        offset = end;
        sentences.push((start, end, sentence));
    }

    let mut claims = Vec::new();
    for (i, (start, end, sentence)) in sentences.iter().enumerate() {
        let trimmed = sentence.trim();
        if trimmed.len() < MIN_CLAIM_LEN {
            continue;
        }

        let claim_keywords = keywords(trimmed);
        let chunk_ids = link_chunks(&claim_keywords, chunks);

        let ctx_start = i.checked_sub(1).and_then(|j| sentences.get(j)).map_or(*start, |(s, _, _)| *s);
        let ctx_end = sentences.get(i + 1).map_or(*end, |(_, e, _)| *e);
        let context = answer.get(ctx_start..ctx_end).unwrap_or(trimmed).trim().to_string();

        claims.push(AtomicClaim {
            text: trimmed.to_string(),
            verifiable: is_verifiable(trimmed),
            context,
            source_position: (*start, *end),
            chunk_ids,
        });
    }
    claims
}

/// Keeps only claims marked `verifiable`. Idempotent:
/// `filter_verifiable(&filter_verifiable(claims))` returns the same
/// claims as `filter_verifiable(claims)`, since every claim it keeps is
/// already verifiable.
#[must_use]
pub fn filter_verifiable(claims: &[AtomicClaim]) -> Vec<AtomicClaim> {
    claims.iter().filter(|c| c.verifiable).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, text: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            path: "a.rs".into(),
            language: "rust".into(),
            symbol_type: "function".into(),
            symbol_name: "f".into(),
            start_line: 1,
            end_line: 1,
            file_hash: "hash".into(),
            text: text.to_string(),
        }
    }

    #[test]
    fn opinion_sentences_are_kept_but_marked_unverifiable() {
        let claims = extract_claims("I think this function handles errors well.", &[]);
        assert_eq!(claims.len(), 1);
        assert!(!claims[0].verifiable);
    }

    #[test]
    fn meta_commentary_sentences_are_marked_unverifiable() {
        let claims = extract_claims("Let me explain how this works.", &[]);
        assert_eq!(claims.len(), 1);
        assert!(!claims[0].verifiable);
    }

    #[test]
    fn questions_are_marked_unverifiable() {
        let claims = extract_claims("Does this function validate its input?", &[]);
        assert_eq!(claims.len(), 1);
        assert!(!claims[0].verifiable);
    }

    #[test]
    fn factual_sentences_are_verifiable() {
        let claims = extract_claims("The function validates user input before writing to disk.", &[]);
        assert_eq!(claims.len(), 1);
        assert!(claims[0].verifiable);
    }

    #[test]
    fn sentences_shorter_than_minimum_are_dropped() {
        let claims = extract_claims("Yes. No. It does.", &[]);
        assert!(claims.is_empty());
    }

    #[test]
    fn claims_link_to_chunks_sharing_keywords() {
        let chunks = vec![chunk("c1", "fn validate_input(data: &str) -> bool { data.len() > 0 }")];
        let claims = extract_claims("The function validate_input checks whether data is present.", &chunks);
        assert_eq!(claims[0].chunk_ids, vec!["c1".to_string()]);
    }

    #[test]
    fn claims_with_no_matching_chunk_have_empty_links() {
        let chunks = vec![chunk("c1", "fn unrelated_thing() {}")];
        let claims = extract_claims("The authentication handler rejects expired tokens immediately.", &chunks);
        assert!(claims[0].chunk_ids.is_empty());
    }

    #[test]
    fn filter_verifiable_drops_opinions_and_questions() {
        let claims = extract_claims(
            "The function validates user input. I think it is elegant. Does it handle nulls?",
            &[],
        );
        let filtered = filter_verifiable(&claims);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].text, "The function validates user input.");
    }

    #[test]
    fn filter_verifiable_is_idempotent() {
        let claims = extract_claims(
            "The function validates user input. I think it is elegant. Does it handle nulls?",
            &[],
        );
        let once = filter_verifiable(&claims);
        let twice = filter_verifiable(&once);
        assert_eq!(once.len(), twice.len());
        assert!(once.iter().zip(twice.iter()).all(|(a, b)| a.text == b.text));
    }
}
