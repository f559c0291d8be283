//! Agent construction seam.
//!
//! The entry handler never names a concrete agent: it asks an injected
//! [`AgentFactory`] for one, exactly once, and then drives it through
//! [`InvokeAgent`].

use agentmem_types::agent::AgentResult;
use agentmem_types::error::AgentError;

use super::engine::Agent;

/// What an agent is bound to for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentBinding {
    pub memory_id: String,
    pub actor_id: String,
    pub session_id: String,
}

/// Anything that can answer a prompt.
pub trait InvokeAgent: Send + Sync {
    fn invoke(
        &self,
        prompt: &str,
    ) -> impl std::future::Future<Output = Result<AgentResult, AgentError>> + Send;
}

/// Builds the agent for a binding.
pub trait AgentFactory: Send + Sync {
    type Agent: InvokeAgent;

    fn create(
        &self,
        binding: &AgentBinding,
    ) -> impl std::future::Future<Output = Result<Self::Agent, AgentError>> + Send;
}

impl InvokeAgent for Agent {
    async fn invoke(&self, prompt: &str) -> Result<AgentResult, AgentError> {
        Agent::invoke(self, prompt).await
    }
}
