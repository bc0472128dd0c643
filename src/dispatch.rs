//! Iterative refinement: runs the reasoning engine, verifies the
//! result, and retries with a refined query until confident, out of
//! iterations, or stuck.

use std::sync::Arc;

use crate::checks::{CodeCheck, run_all};
use crate::claims::{extract_claims, filter_verifiable};
use crate::config::EngineConfig;
use crate::embed::Embedder;
use crate::engine::answer_question;
use crate::evidence::build_evidence;
use crate::model::ReasoningModel;
use crate::retrieve::{SearchConfig, hybrid_search};
use crate::state::State;
use crate::store::VectorStore;
use crate::types::{Chunk, ConfidenceLevel, ConfidenceReport, ContextChunk, VerificationResult, VerifiedResult};
use crate::verify::{refinement_hints, verify};

/// Message returned when a question's retrieval query surfaces no
/// chunks at all, rather than an empty answer.
const NO_CONTEXT_MESSAGE: &str = "No relevant context found for this query.";

trait ConfidenceReportExt {
    fn compute(chunks: &[ContextChunk], verification: &VerificationResult) -> Self;
    fn empty(reason: &str) -> Self;
}

impl ConfidenceReportExt for ConfidenceReport {
    fn compute(chunks: &[ContextChunk], verification: &VerificationResult) -> Self {
        let retrieval_score = if chunks.is_empty() {
            0.0
        } else {
            chunks.iter().map(|c| c.relevance).sum::<f64>() / chunks.len() as f64
        };
        let chunk_saturation = (chunks.len() as f64 / 10.0).min(1.0);
        let combined = retrieval_score * 0.40
            + verification.coverage_ratio * 0.35
            + chunk_saturation * 0.10
            + verification.consistency * 0.15;

        let mut warnings = Vec::new();
        if retrieval_score < 0.3 {
            warnings.push("Low retrieval score: chunks pulled into context scored poorly.".to_string());
        }
        if verification.coverage_ratio < 0.5 {
            warnings.push("Low evidence coverage: many claims could not be linked to a chunk.".to_string());
        }
        if chunks.len() < 3 {
            warnings.push("Few chunks retrieved: consider broadening the query.".to_string());
        }

        Self {
            retrieval_score,
            evidence_coverage: verification.coverage_ratio,
            chunk_saturation,
            consistency: verification.consistency,
            combined,
            level: ConfidenceLevel::from_score(combined),
            warnings,
        }
    }

    fn empty(reason: &str) -> Self {
        Self {
            retrieval_score: 0.0,
            evidence_coverage: 0.0,
            chunk_saturation: 0.0,
            consistency: 0.0,
            combined: 0.0,
            level: ConfidenceLevel::Low,
            warnings: vec![reason.to_string()],
        }
    }
}

/// Fraction of whitespace-split words in `a` that also appear in `b`.
fn word_overlap(a: &str, b: &str) -> f64 {
    let words_a: Vec<&str> = a.split_whitespace().collect();
    if words_a.is_empty() {
        return 0.0;
    }
    let words_b: std::collections::HashSet<&str> = b.split_whitespace().collect();
    let shared = words_a.iter().filter(|w| words_b.contains(*w)).count();
    shared as f64 / words_a.len() as f64
}

/// Blocks another refinement pass when the confidence delta is
/// negligible or the new error closely repeats the previous one,
/// guarding against an infinite refinement loop that makes no progress.
fn should_recurse(prev_confidence: f64, current_confidence: f64, prev_error: &str, current_error: &str) -> bool {
    if (current_confidence - prev_confidence).abs() < 0.05 {
        return false;
    }
    if !prev_error.is_empty() && !current_error.is_empty() && word_overlap(current_error, prev_error) > 0.5 {
        return false;
    }
    true
}

/// Builds the next iteration's query from the verifier's gap reasons,
/// or `None` when the verifier is confident or has nothing to suggest.
fn next_query(current_query: &str, verification: &VerificationResult) -> Option<String> {
    if verification.confident {
        return None;
    }
    let hints = refinement_hints(verification);
    if hints.is_empty() {
        return None;
    }
    Some(format!("{current_query} ({})", hints.join(" ")))
}

/// Runs the reasoning engine for `question`, verifying and refining the
/// answer up to `config.max_recursions` times. Never returns an error:
/// failures degrade into a low-confidence [`VerifiedResult`] instead.
pub async fn dispatch(
    question: &str,
    config: &EngineConfig,
    model: &Arc<dyn ReasoningModel>,
    embedder: &Arc<dyn Embedder>,
    store: &Arc<dyn VectorStore>,
    checks: &[Box<dyn CodeCheck>],
) -> VerifiedResult {
    let mut current_query = question.to_string();
    let mut prev_confidence = 0.0;
    let mut prev_error = String::new();

    for iteration in 1..=config.max_recursions.max(1) {
        let search = hybrid_search(&current_query, &config.collection, embedder, store, &SearchConfig::default()).await;
        if !matches!(&search, Ok(results) if !results.is_empty()) {
            return VerifiedResult {
                answer: NO_CONTEXT_MESSAGE.to_string(),
                evidence: Vec::new(),
                verification: VerificationResult {
                    coverage_ratio: 0.0,
                    consistency: 0.0,
                    overall_confidence: 0.0,
                    confident: false,
                    gap_reasons: vec!["No chunks retrieved from vector search".to_string()],
                    suggested_refinement: None,
                },
                confidence_report: ConfidenceReport::empty("No chunks retrieved from vector search"),
                reasoning: Vec::new(),
                tokens_used: 0,
                recursion_depth: 0,
                iterations: iteration,
            };
        }

        let mut state = State::new();
        let (answer, outcome_evidence, error) = match answer_question(&current_query, &mut state, config, model, embedder, store).await {
            Ok(outcome) => (outcome.text, outcome.evidence, String::new()),
            Err(e) => (String::new(), Vec::new(), e.to_string()),
        };

        let chunks: Vec<Chunk> = state.chunks.iter().map(|c| c.chunk.clone()).collect();
        let claims = filter_verifiable(&extract_claims(&answer, &chunks));
        let evidence = if outcome_evidence.is_empty() { build_evidence(&claims) } else { outcome_evidence };
        let check_outcomes = run_all(checks);
        let mut verification = verify(&claims, &evidence, &chunks, &check_outcomes, config.confidence_threshold);
        let report_for_query = verification.clone();
        verification.suggested_refinement = next_query(&current_query, &report_for_query);

        let mut report = ConfidenceReport::compute(&state.chunks, &verification);
        let confident = verification.confident;
        let current_confidence = report.combined;

        let result = VerifiedResult {
            answer,
            evidence,
            verification: verification.clone(),
            confidence_report: report.clone(),
            reasoning: state.reasoning.clone(),
            tokens_used: state.tokens_used,
            recursion_depth: state.depth,
            iterations: iteration,
        };

        if confident || iteration == config.max_recursions {
            return result;
        }
        if !should_recurse(prev_confidence, current_confidence, &prev_error, &error) {
            report.warnings.push("Refinement halted: no further progress between iterations.".to_string());
            return VerifiedResult { confidence_report: report, ..result };
        }

        current_query = verification.suggested_refinement.clone().unwrap_or(current_query);
        prev_confidence = current_confidence;
        prev_error = error;
    }

    unreachable!("max_recursions.max(1) guarantees at least one iteration returns above")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::chunk_file;
    use crate::embed::fallback::FallbackEmbedder;
    use crate::model::ModelResponse;
    use crate::model::scripted::ScriptedModel;
    use crate::sparse::lexical_sparse_vector;
    use crate::store::memory::MemoryStore;
    use crate::store::{Distance, Point};

    fn harness() -> (Arc<dyn Embedder>, Arc<dyn VectorStore>, EngineConfig) {
        (Arc::new(FallbackEmbedder::new(32)), Arc::new(MemoryStore::new()), EngineConfig::default())
    }

    async fn seeded_harness() -> (Arc<dyn Embedder>, Arc<dyn VectorStore>, EngineConfig) {
        let embedder: Arc<dyn Embedder> = Arc::new(FallbackEmbedder::new(32));
        let store: Arc<dyn VectorStore> = Arc::new(MemoryStore::new());
        let config = EngineConfig { collection: "c".to_string(), ..EngineConfig::default() };
        store.create_collection("c", embedder.dimensions(), Distance::Cosine).await.unwrap();

        let src = "fn validate_input(data: &[u8]) -> bool { data.len() > 0 }\n\nfn write_to_disk() {}\n";
        let chunks = chunk_file("a.rs", src.as_bytes(), 2_000).unwrap();
        let mut points = Vec::new();
        for chunk in &chunks {
            let dense = embedder.embed(&chunk.text).await.unwrap();
            let sparse = lexical_sparse_vector(&chunk.text);
            points.push(Point::from_chunk(chunk, dense, sparse));
        }
        store.upsert("c", points).await.unwrap();
        (embedder, store, config)
    }

    #[tokio::test]
    async fn dispatch_reports_no_context_when_retrieval_is_empty() {
        let (embedder, store, config) = harness();
        let model: Arc<dyn ReasoningModel> = Arc::new(ScriptedModel::new(Vec::new()));
        let result = dispatch("anything", &config, &model, &embedder, &store, &[]).await;
        assert_eq!(result.answer, NO_CONTEXT_MESSAGE);
        assert_eq!(result.iterations, 1);
        assert!(!result.verification.confident);
    }

    #[tokio::test]
    async fn dispatch_returns_the_model_answer_on_success() {
        let (embedder, store, config) = seeded_harness().await;
        let model: Arc<dyn ReasoningModel> =
            Arc::new(ScriptedModel::immediate_answer("The function validates input before writing to disk."));
        let result = dispatch("what does it do", &config, &model, &embedder, &store, &[]).await;
        assert!(!result.answer.is_empty());
        assert_eq!(result.iterations, 1);
    }

    #[tokio::test]
    async fn dispatch_populates_the_confidence_report_and_reasoning() {
        let (embedder, store, config) = seeded_harness().await;
        let model: Arc<dyn ReasoningModel> = Arc::new(ScriptedModel::new(vec![
            ModelResponse {
                text: String::new(),
                tool_calls: vec![crate::model::ToolCall::PeekContext { start: 1, end: 2 }],
            },
            ModelResponse {
                text: String::new(),
                tool_calls: vec![crate::model::ToolCall::FinalAnswer {
                    text: "It validates input.".into(),
                    evidence: vec!["c1".into()],
                    confidence: 0.8,
                }],
            },
        ]));
        let result = dispatch("what does it do", &config, &model, &embedder, &store, &[]).await;
        assert_eq!(result.recursion_depth, 0);
        assert!(!result.reasoning.is_empty());
        assert_eq!(result.evidence.len(), 1);
        assert_eq!(result.evidence[0].source_chunk_ids, vec!["c1".to_string()]);
        assert!((result.confidence_report.combined - result.verification.overall_confidence).abs() < 1.0);
    }

    #[tokio::test]
    async fn should_recurse_blocks_on_negligible_confidence_delta() {
        assert!(!should_recurse(0.5, 0.52, "", ""));
    }

    #[tokio::test]
    async fn should_recurse_blocks_on_repeated_error() {
        assert!(!should_recurse(0.3, 0.6, "timeout exceeded after 60s", "timeout exceeded after 60s"));
    }

    #[tokio::test]
    async fn should_recurse_allows_genuine_progress() {
        assert!(should_recurse(0.2, 0.5, "retrieval error: none", ""));
    }

    #[tokio::test]
    async fn next_query_appends_refinement_hints_when_not_confident() {
        let verification = VerificationResult {
            coverage_ratio: 0.0,
            consistency: 0.0,
            overall_confidence: 0.0,
            confident: false,
            gap_reasons: vec!["No evidence found".to_string()],
            suggested_refinement: None,
        };
        let refined = next_query("original question", &verification).unwrap();
        assert!(refined.starts_with("original question ("));
        assert!(refined.contains("Broaden retrieval"));
    }

    #[tokio::test]
    async fn next_query_is_none_once_confident() {
        let verification = VerificationResult {
            coverage_ratio: 1.0,
            consistency: 1.0,
            overall_confidence: 1.0,
            confident: true,
            gap_reasons: Vec::new(),
            suggested_refinement: None,
        };
        assert!(next_query("q", &verification).is_none());
    }

    #[tokio::test]
    async fn dispatch_refines_the_query_between_iterations() {
        let (embedder, store, mut config) = seeded_harness().await;
        config.max_recursions = 2;
        config.confidence_threshold = 2.0; // unreachable, forces a second iteration
        let model: Arc<dyn ReasoningModel> = Arc::new(ScriptedModel::new(vec![
            ModelResponse {
                text: String::new(),
                tool_calls: vec![crate::model::ToolCall::FinalAnswer { text: "first pass".into(), evidence: Vec::new(), confidence: 0.5 }],
            },
            ModelResponse {
                text: String::new(),
                tool_calls: vec![crate::model::ToolCall::FinalAnswer { text: "second pass".into(), evidence: Vec::new(), confidence: 0.6 }],
            },
        ]));
        let result = dispatch("original question", &config, &model, &embedder, &store, &[]).await;
        assert_eq!(result.iterations, 2);
        assert_eq!(result.answer, "second pass");
    }

    #[tokio::test]
    async fn dispatch_stops_after_max_recursions() {
        let (embedder, store, mut config) = seeded_harness().await;
        config.max_recursions = 2;
        config.confidence_threshold = 2.0;
        let responses: Vec<_> = (0..20)
            .map(|_| ModelResponse {
                text: String::new(),
                tool_calls: vec![crate::model::ToolCall::FinalAnswer { text: "stuck".into(), evidence: Vec::new(), confidence: 0.1 }],
            })
            .collect();
        let model: Arc<dyn ReasoningModel> = Arc::new(ScriptedModel::new(responses));
        let result = dispatch("q", &config, &model, &embedder, &store, &[]).await;
        assert!(result.iterations <= 2);
    }
}
