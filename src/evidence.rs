//! Linking claims to evidence and scoring how well they're covered.

use std::collections::HashMap;

use crate::types::{AtomicClaim, Chunk, Coverage, Evidence};

/// Confidence below which evidence is treated as a coverage gap.
pub const LOW_CONFIDENCE_THRESHOLD: f64 = 0.4;

/// Builds one [`Evidence`] record per claim, with confidence derived
/// from how many chunks back it and how strong the strongest link is.
#[must_use]
pub fn build_evidence(claims: &[AtomicClaim]) -> Vec<Evidence> {
    claims
        .iter()
        .map(|claim| {
            let confidence = if claim.chunk_ids.is_empty() {
                0.0
            } else {
                // More corroborating chunks raise confidence, saturating at 3.
                (claim.chunk_ids.len() as f64 / 3.0).min(1.0)
            };
            Evidence { claim: claim.text.clone(), source_chunk_ids: claim.chunk_ids.clone(), confidence }
        })
        .collect()
}

/// Classifies each claim's coverage given its evidence.
#[must_use]
pub fn assess_coverage(claims: &[AtomicClaim], evidence: &[Evidence]) -> Vec<Coverage> {
    claims
        .iter()
        .map(|claim| {
            let Some(ev) = evidence.iter().find(|e| e.claim == claim.text) else {
                return Coverage::Gap("No evidence found".to_string());
            };
            if ev.source_chunk_ids.is_empty() {
                return Coverage::Gap("Evidence has no source chunks".to_string());
            }
            if ev.confidence < LOW_CONFIDENCE_THRESHOLD {
                return Coverage::Gap("Low confidence evidence".to_string());
            }
            Coverage::Covered
        })
        .collect()
}

/// Fraction of `coverage` entries that are [`Coverage::Covered`].
#[must_use]
pub fn coverage_ratio(coverage: &[Coverage]) -> f64 {
    if coverage.is_empty() {
        return 0.0;
    }
    let covered = coverage.iter().filter(|c| matches!(c, Coverage::Covered)).count();
    covered as f64 / coverage.len() as f64
}

/// Fraction of chunks referenced by `evidence` that share the most
/// common source file path among all referenced chunks.
#[must_use]
pub fn consistency(evidence: &[Evidence], chunks: &[Chunk]) -> f64 {
    let paths: Vec<&str> = evidence
        .iter()
        .flat_map(|e| &e.source_chunk_ids)
        .filter_map(|id| chunks.iter().find(|c| &c.id == id))
        .map(|c| c.path.as_str())
        .collect();
    if paths.is_empty() {
        return 0.0;
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for path in &paths {
        *counts.entry(path).or_insert(0) += 1;
    }
    let dominant = counts.values().copied().max().unwrap_or(0);
    dominant as f64 / paths.len() as f64
}

/// Collects the distinct gap reasons from `coverage`, preserving first
/// occurrence order.
#[must_use]
pub fn gap_reasons(coverage: &[Coverage]) -> Vec<String> {
    let mut reasons = Vec::new();
    for c in coverage {
        if let Coverage::Gap(reason) = c {
            if !reasons.contains(reason) {
                reasons.push(reason.clone());
            }
        }
    }
    reasons
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(text: &str, chunk_ids: Vec<&str>) -> AtomicClaim {
        AtomicClaim {
            text: text.to_string(),
            verifiable: true,
            context: text.to_string(),
            source_position: (0, text.len()),
            chunk_ids: chunk_ids.into_iter().map(String::from).collect(),
        }
    }

    fn chunk(id: &str, path: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            path: path.to_string(),
            language: "rust".into(),
            symbol_type: "function".into(),
            symbol_name: "f".into(),
            start_line: 1,
            end_line: 1,
            file_hash: "hash".into(),
            text: String::new(),
        }
    }

    #[test]
    fn claim_with_no_chunks_is_a_gap() {
        let claims = vec![claim("x", vec![])];
        let evidence = build_evidence(&claims);
        let coverage = assess_coverage(&claims, &evidence);
        assert!(matches!(coverage[0], Coverage::Gap(ref r) if r == "Evidence has no source chunks"));
    }

    #[test]
    fn claim_with_three_chunks_is_covered() {
        let claims = vec![claim("x", vec!["a", "b", "c"])];
        let evidence = build_evidence(&claims);
        let coverage = assess_coverage(&claims, &evidence);
        assert!(matches!(coverage[0], Coverage::Covered));
    }

    #[test]
    fn coverage_ratio_of_all_covered_is_one() {
        let coverage = vec![Coverage::Covered, Coverage::Covered];
        assert!((coverage_ratio(&coverage) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn consistency_reflects_dominant_path() {
        let evidence = vec![Evidence { claim: "x".into(), source_chunk_ids: vec!["a".into(), "b".into(), "c".into()], confidence: 1.0 }];
        let chunks = vec![chunk("a", "foo.rs"), chunk("b", "foo.rs"), chunk("c", "bar.rs")];
        let score = consistency(&evidence, &chunks);
        assert!((score - (2.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn gap_reasons_deduplicates_preserving_order() {
        let coverage = vec![
            Coverage::Gap("No evidence found".into()),
            Coverage::Gap("No evidence found".into()),
            Coverage::Gap("Low confidence evidence".into()),
        ];
        assert_eq!(gap_reasons(&coverage), vec!["No evidence found".to_string(), "Low confidence evidence".to_string()]);
    }
}
