use thiserror::Error;

use crate::llm::LlmError;

/// Errors from the managed memory service.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("memory service request failed: {0}")]
    Request(String),

    #[error("memory service returned HTTP {status}: {body}")]
    Service { status: u16, body: String },

    #[error("memory resource not found: {0}")]
    NotFound(String),

    #[error("memory service throttled the request")]
    Throttled,

    #[error("malformed memory service response: {0}")]
    Deserialization(String),
}

/// Errors raised while executing a tool on behalf of the model.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid tool input: {0}")]
    InvalidInput(String),

    #[error("evaluation failed: {0}")]
    Evaluation(String),
}

/// Errors from an agent invocation.
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("model call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("memory call failed: {0}")]
    Memory(#[from] MemoryError),

    #[error("agent construction failed: {0}")]
    Construction(String),

    #[error("tool loop exceeded {0} rounds")]
    ToolLoopExhausted(u8),
}

/// Errors from calling a deployed agent runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("runtime request failed: {0}")]
    Request(String),

    #[error("runtime returned HTTP {status}: {body}")]
    Service { status: u16, body: String },

    #[error("runtime response stream failed: {0}")]
    Stream(String),

    #[error("runtime response is not valid UTF-8")]
    InvalidUtf8,

    #[error("runtime response is not valid JSON: {0}")]
    InvalidJson(String),
}

/// Errors from reading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
