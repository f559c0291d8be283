//! AgentRuntimeInvoker trait definition.

use agentmem_types::error::RuntimeError;
use agentmem_types::runtime::{AgentRuntimeArn, RuntimeInvocation};

/// Client for a deployed agent runtime.
///
/// Implementations live in agentmem-infra (e.g., `AgentCoreRuntimeClient`).
pub trait AgentRuntimeInvoker: Send + Sync {
    /// Send one payload and return the decoded JSON response body.
    fn invoke(
        &self,
        runtime: &AgentRuntimeArn,
        invocation: &RuntimeInvocation,
    ) -> impl std::future::Future<Output = Result<serde_json::Value, RuntimeError>> + Send;
}
