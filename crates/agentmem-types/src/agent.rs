//! Agent configuration and result types.
//!
//! `AgentConfig` bundles the model settings needed to run a conversational
//! agent; `AgentResult` is what a single invocation hands back.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::llm::{Message, StopReason, Usage};

/// Default model when `MODEL_ID` is unset.
pub const DEFAULT_MODEL_ID: &str = "us.anthropic.claude-3-7-sonnet-20250219-v1:0";

/// System prompt given to the memory-backed assistant.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant with memory. \
Remember user preferences and facts across conversations. \
Use the calculate tool for math problems.";

/// Model settings for a conversational agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    pub model: String,
    pub system_prompt: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    /// Upper bound on model calls per invocation while tools are requested.
    pub max_tool_rounds: u8,
}

impl AgentConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL_ID.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: 4_096,
            temperature: None,
            max_tool_rounds: 8,
        }
    }
}

/// Result of one agent invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentResult {
    /// Final assistant message.
    pub message: Message,
    pub stop_reason: StopReason,
    /// Usage summed across every model call of the invocation.
    pub usage: Usage,
}

impl AgentResult {
    /// Text of the first content block, if that block is text.
    pub fn first_text(&self) -> Option<&str> {
        self.message.content.first().and_then(|block| block.as_text())
    }
}

impl fmt::Display for AgentResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.message.text())
    }
}
