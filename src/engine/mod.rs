//! Tool-calling reasoning loop.
//!
//! Drives a [`ReasoningModel`] through up to [`MAX_ITERATIONS`] turns,
//! executing whatever tools it requests against the working [`State`]
//! and the retrieval layer, until it calls `final_answer`, returns a
//! turn with no tool calls, or the safety cap is hit.

pub mod prompts;

use std::collections::VecDeque;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::embed::Embedder;
use crate::error::{EngineError, Result};
use crate::model::{Message, ReasoningModel, ToolCall};
use crate::retrieve::{SearchConfig, hybrid_search};
use crate::state::State;
use crate::store::VectorStore;
use crate::types::{ContextChunk, Evidence};

/// Hard cap on reasoning turns per [`answer_question`] call, independent
/// of the dispatcher's own refinement-iteration cap.
pub const MAX_ITERATIONS: u32 = 10;

/// Confidence assigned to a turn that produces free text with no tool
/// calls at all: the model never cited evidence, so the answer is taken
/// at face value but scored low.
const NO_TOOL_CALL_CONFIDENCE: f64 = 0.3;

/// Number of leading characters of the answer used as the synthesized
/// claim text for evidence materialized from `final_answer`'s cited ids.
const EVIDENCE_CLAIM_PREFIX_LEN: usize = 100;

/// Result of running the reasoning loop to completion: the answer text
/// plus whatever evidence the model cited when it called `final_answer`.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    /// The final answer text.
    pub text: String,
    /// Evidence materialized from the ids `final_answer` cited, or
    /// synthesized from a bare-text turn.
    pub evidence: Vec<Evidence>,
    /// The model's self-reported confidence, or [`NO_TOOL_CALL_CONFIDENCE`]
    /// when no tool call was used at all.
    pub confidence: f64,
}

/// Estimates the token cost of a piece of model-facing text the same
/// way this crate's chunker estimates token counts elsewhere: one token
/// per four characters, rounded up.
#[must_use]
pub fn estimate_tokens(text: &str) -> u64 {
    (text.len() as u64).div_ceil(4)
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}

fn materialize_evidence(answer: &str, evidence_ids: &[String], confidence: f64) -> Vec<Evidence> {
    let claim = truncate_chars(answer, EVIDENCE_CLAIM_PREFIX_LEN);
    evidence_ids
        .iter()
        .map(|id| Evidence { claim: claim.clone(), source_chunk_ids: vec![id.clone()], confidence })
        .collect()
}

fn describe_tool_call(call: &ToolCall) -> String {
    match call {
        ToolCall::PeekContext { start, end } => format!("peek_context({start}, {end})"),
        ToolCall::SearchContext { pattern } => format!("search_context({pattern:?})"),
        ToolCall::GetChunk { chunk_id } => format!("get_chunk({chunk_id})"),
        ToolCall::SubQuery { question } => format!("sub_query({question:?})"),
        ToolCall::FinalAnswer { text, evidence, confidence } => {
            format!("final_answer(answer={text:?}, evidence={evidence:?}, confidence={confidence})")
        }
    }
}

/// Runs the reasoning loop for `question`, mutating `state` as evidence
/// accumulates, and returns the final answer plus any cited evidence.
pub async fn answer_question(
    question: &str,
    state: &mut State,
    config: &EngineConfig,
    model: &Arc<dyn ReasoningModel>,
    embedder: &Arc<dyn Embedder>,
    store: &Arc<dyn VectorStore>,
) -> Result<AnswerOutcome> {
    let system_prompt = if state.depth == 0 {
        prompts::PRIMARY_SYSTEM_PROMPT
    } else {
        prompts::SUBQUERY_SYSTEM_PROMPT
    };

    let seed = hybrid_search(question, &config.collection, embedder, store, &SearchConfig::default()).await;
    if let Ok(results) = seed {
        for result in results {
            state.chunks.push(ContextChunk { chunk: result.chunk, relevance: result.score });
        }
    }

    let mut messages = vec![Message::user(format!("{question}\n\n<context>\n{}\n</context>", state.get_context_summary()))];
    let mut pending_sub_queries: VecDeque<String> = VecDeque::new();

    for _ in 0..MAX_ITERATIONS {
        if state.tokens_used >= config.token_budget {
            return Err(EngineError::BudgetExhausted { used: state.tokens_used, budget: config.token_budget }.into());
        }

        let response = model.complete(system_prompt, &messages).await?;
        state.charge_tokens(estimate_tokens(&response.text));

        if response.tool_calls.is_empty() {
            state.reasoning.push(response.text.clone());
            return Ok(AnswerOutcome { text: response.text, evidence: Vec::new(), confidence: NO_TOOL_CALL_CONFIDENCE });
        }

        if !response.text.is_empty() {
            state.reasoning.push(response.text.clone());
            messages.push(Message::assistant(response.text.clone()));
        }

        let mut turn_results = Vec::new();
        let mut final_answer = None;

        for call in response.tool_calls {
            state.reasoning.push(describe_tool_call(&call));
            match call {
                ToolCall::PeekContext { start, end } => {
                    let lines = state.get_context_lines(start, end);
                    turn_results.push(format!("peek_context({start}, {end}):\n{}", lines.join("\n")));
                }
                ToolCall::SearchContext { pattern } => {
                    let hits = state.search_context(&pattern);
                    let rendered = hits
                        .iter()
                        .map(|(id, line, text)| format!("{id}:{line}: {text}"))
                        .collect::<Vec<_>>()
                        .join("\n");
                    turn_results.push(format!("search_context({pattern}):\n{rendered}"));
                }
                ToolCall::GetChunk { chunk_id } => {
                    let found = state.chunks.iter().find(|c| c.chunk.id == chunk_id);
                    let rendered = found.map_or_else(|| "not found".to_string(), |c| c.chunk.text.clone());
                    turn_results.push(format!("get_chunk({chunk_id}):\n{rendered}"));
                }
                ToolCall::SubQuery { question } => {
                    pending_sub_queries.push_back(question);
                }
                ToolCall::FinalAnswer { text, evidence, confidence } => {
                    final_answer = Some((text, evidence, confidence));
                }
            }
        }

        if !turn_results.is_empty() {
            messages.push(Message::user(turn_results.join("\n\n")));
        }

        // Sub-queries are consumed only after this turn's other tool
        // results have been appended, so the model sees both in order.
        while let Some(sub_question) = pending_sub_queries.pop_front() {
            if !state.can_recurse(config.max_depth) {
                messages.push(Message::user(format!("sub_query(\"{sub_question}\") skipped: max recursion depth reached")));
                continue;
            }
            let mut sub_state = State { depth: state.depth + 1, ..State::new() };
            let outcome = Box::pin(answer_question(&sub_question, &mut sub_state, config, model, embedder, store)).await;
            match outcome {
                Ok(sub_outcome) => {
                    state.tokens_used += sub_state.tokens_used;
                    state.evidence.extend(sub_state.evidence);
                    state.evidence.extend(sub_outcome.evidence);
                    messages.push(Message::user(format!("sub_query(\"{sub_question}\") -> {}", sub_outcome.text)));
                }
                Err(e) => {
                    messages.push(Message::user(format!("sub_query(\"{sub_question}\") failed: {e}")));
                }
            }
        }

        if let Some((text, evidence_ids, confidence)) = final_answer {
            let evidence = materialize_evidence(&text, &evidence_ids, confidence);
            return Ok(AnswerOutcome { text, evidence, confidence });
        }
    }

    Err(EngineError::ValidationError("reasoning loop exceeded maximum iterations without a final answer".to_string()).into())
}
