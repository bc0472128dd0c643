//! The reasoning model external collaborator.
//!
//! The engine never talks to a specific chat API directly; it depends
//! on [`ReasoningModel`]. [`scripted::ScriptedModel`] is a deterministic
//! test double used throughout this crate's tests; a live backend (for
//! example OpenAI-compatible, behind the `openai-model` feature) is the
//! operator's responsibility to plug in.

pub mod scripted;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One turn of conversation sent to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// `"system"`, `"user"`, or `"assistant"`.
    pub role: String,
    /// Message text.
    pub content: String,
}

impl Message {
    /// Builds a user-role message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    /// Builds an assistant-role message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

/// A tool the reasoning model may invoke instead of (or in addition to)
/// producing text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "tool", rename_all = "snake_case")]
pub enum ToolCall {
    /// Reads a window of lines from the accumulated context.
    PeekContext {
        /// First line, 1-indexed inclusive.
        start: u32,
        /// Last line, 1-indexed inclusive.
        end: u32,
    },
    /// Searches the accumulated context with a regex.
    SearchContext {
        /// Case-insensitive regex pattern.
        pattern: String,
    },
    /// Fetches a specific chunk by id, even if not yet in context.
    GetChunk {
        /// Target chunk id.
        chunk_id: String,
    },
    /// Recursively dispatches a narrower sub-question.
    SubQuery {
        /// The sub-question to answer.
        question: String,
    },
    /// Ends reasoning with a final natural-language answer.
    FinalAnswer {
        /// The answer text.
        text: String,
        /// Ids of chunks cited in support of `text`.
        #[serde(default)]
        evidence: Vec<String>,
        /// The model's self-reported confidence in `text`, `[0.0, 1.0]`.
        #[serde(default)]
        confidence: f64,
    },
}

/// One model turn: free text plus zero or more requested tool calls.
/// The engine evaluates `tool_calls` in order and feeds their results
/// back as the next user turn.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    /// The model's free-text commentary for this turn.
    pub text: String,
    /// Tools the model wants invoked.
    pub tool_calls: Vec<ToolCall>,
}

/// A chat-style reasoning backend capable of requesting tool calls.
#[async_trait]
pub trait ReasoningModel: Send + Sync {
    /// Produces the next turn given a system prompt and the
    /// conversation so far.
    async fn complete(&self, system_prompt: &str, messages: &[Message]) -> Result<ModelResponse>;
}
