//! Blending coverage, consistency, and optional code checks into one
//! confidence score for a dispatch iteration.

use crate::checks::CheckOutcome;
use crate::evidence::{assess_coverage, coverage_ratio, gap_reasons};
use crate::types::{AtomicClaim, Chunk, Evidence, VerificationResult};

/// Verifies one iteration's claims/evidence against its source chunks
/// and any run [`CheckOutcome`]s, producing a [`VerificationResult`].
#[must_use]
pub fn verify(
    claims: &[AtomicClaim],
    evidence: &[Evidence],
    chunks: &[Chunk],
    check_outcomes: &[CheckOutcome],
    confidence_threshold: f64,
) -> VerificationResult {
    let coverage = assess_coverage(claims, evidence);
    let coverage_ratio = coverage_ratio(&coverage);
    let consistency = crate::evidence::consistency(evidence, chunks);

    let failed_checks = check_outcomes.iter().filter(|c| !c.passed).count();
    let mut overall_confidence = coverage_ratio - 0.2 * failed_checks as f64;
    if !check_outcomes.is_empty() && failed_checks == 0 {
        overall_confidence += 0.1;
    }
    overall_confidence = overall_confidence.clamp(0.0, 1.0);

    let gap_reasons = gap_reasons(&coverage);
    let confident = overall_confidence >= confidence_threshold;
    VerificationResult {
        coverage_ratio,
        consistency,
        overall_confidence,
        confident,
        suggested_refinement: None,
        gap_reasons,
    }
}

/// Generates operator-facing hints for why confidence was low, derived
/// from the gap reasons recorded on `result`.
#[must_use]
pub fn refinement_hints(result: &VerificationResult) -> Vec<String> {
    result
        .gap_reasons
        .iter()
        .map(|reason| match reason.as_str() {
            "No evidence found" => "Broaden retrieval or rephrase the question to surface more chunks.".to_string(),
            "Evidence has no source chunks" => "The claim could not be linked to any chunk; consider dropping or rewording it.".to_string(),
            "Low confidence evidence" => "Gather corroborating chunks before trusting this claim.".to_string(),
            other => format!("Unresolved gap: {other}"),
        })
        .collect()
}
