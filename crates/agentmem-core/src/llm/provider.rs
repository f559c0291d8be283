//! LlmProvider trait definition.
//!
//! This is the core abstraction that all model providers implement.
//! Uses RPITIT for `converse`; `BoxLlmProvider` erases the concrete type.

use agentmem_types::llm::{ConverseRequest, ConverseResponse, LlmError};

/// Trait for model provider backends (Bedrock Converse, test doubles).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
///
/// Implementations live in agentmem-infra (e.g., `BedrockConverseProvider`).
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "bedrock").
    fn name(&self) -> &str;

    /// Send one conversation round and receive the full assistant turn.
    fn converse(
        &self,
        request: &ConverseRequest,
    ) -> impl std::future::Future<Output = Result<ConverseResponse, LlmError>> + Send;
}
