//! A scripted [`ReasoningModel`] for tests: returns a fixed sequence of
//! responses regardless of what it is asked, advancing one step per call.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{Message, ModelResponse, ReasoningModel, ToolCall};
use crate::error::{EngineError, Result};

/// Replays a pre-scripted sequence of [`ModelResponse`]s.
pub struct ScriptedModel {
    responses: Mutex<Vec<ModelResponse>>,
}

impl ScriptedModel {
    /// Builds a model that returns `responses` in order, one per call,
    /// then errors if called again after exhaustion.
    #[must_use]
    pub fn new(responses: Vec<ModelResponse>) -> Self {
        Self { responses: Mutex::new(responses) }
    }

    /// Convenience constructor for a model that immediately calls
    /// `final_answer` with `text`, citing no evidence and reporting full
    /// confidence.
    #[must_use]
    pub fn immediate_answer(text: impl Into<String>) -> Self {
        Self::new(vec![ModelResponse {
            text: String::new(),
            tool_calls: vec![ToolCall::FinalAnswer { text: text.into(), evidence: Vec::new(), confidence: 1.0 }],
        }])
    }
}

#[async_trait]
impl ReasoningModel for ScriptedModel {
    async fn complete(&self, _system_prompt: &str, _messages: &[Message]) -> Result<ModelResponse> {
        let mut guard = self.responses.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if guard.is_empty() {
            return Err(EngineError::ModelError("scripted model exhausted".to_string()).into());
        }
        Ok(guard.remove(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_responses_in_order() {
        let model = ScriptedModel::new(vec![
            ModelResponse { text: "first".into(), tool_calls: Vec::new() },
            ModelResponse { text: "second".into(), tool_calls: Vec::new() },
        ]);
        let a = model.complete("sys", &[]).await.unwrap();
        let b = model.complete("sys", &[]).await.unwrap();
        assert_eq!(a.text, "first");
        assert_eq!(b.text, "second");
    }

    #[tokio::test]
    async fn errors_once_exhausted() {
        let model = ScriptedModel::new(Vec::new());
        assert!(model.complete("sys", &[]).await.is_err());
    }

    #[tokio::test]
    async fn immediate_answer_emits_final_answer_tool_call() {
        let model = ScriptedModel::immediate_answer("done");
        let response = model.complete("sys", &[]).await.unwrap();
        assert_eq!(
            response.tool_calls,
            vec![ToolCall::FinalAnswer { text: "done".into(), evidence: Vec::new(), confidence: 1.0 }]
        );
    }
}
