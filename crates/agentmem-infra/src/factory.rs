//! Agent factory wiring Bedrock and AgentCore Memory into an [`Agent`].

use std::sync::Arc;

use secrecy::SecretString;

use agentmem_core::agent::{Agent, AgentBinding, AgentFactory};
use agentmem_core::memory::box_client::BoxMemoryClient;
use agentmem_core::memory::session::MemorySessionManager;
use agentmem_core::tools::ToolRegistry;
use agentmem_types::agent::AgentConfig;
use agentmem_types::config::RuntimeConfig;
use agentmem_types::error::AgentError;
use agentmem_types::memory::MemoryConfig;

use crate::agentcore::AgentCoreMemoryClient;
use crate::aws::CredentialsProvider;
use crate::llm::{bearer_token_from_lookup, create_provider};

/// Builds agents backed by Bedrock Converse and AgentCore Memory.
pub struct AgentCoreAgentFactory {
    config: RuntimeConfig,
    credentials: Arc<CredentialsProvider>,
    bearer_token: Option<SecretString>,
}

impl AgentCoreAgentFactory {
    pub fn new(
        config: RuntimeConfig,
        credentials: Arc<CredentialsProvider>,
        bearer_token: Option<SecretString>,
    ) -> Self {
        Self {
            config,
            credentials,
            bearer_token,
        }
    }

    /// Credentials and Bedrock API key from the process environment.
    pub fn from_env(config: RuntimeConfig) -> Self {
        Self::new(
            config,
            Arc::new(CredentialsProvider::from_env()),
            bearer_token_from_lookup(|name| std::env::var(name).ok()),
        )
    }
}

impl AgentFactory for AgentCoreAgentFactory {
    type Agent = Agent;

    async fn create(&self, binding: &AgentBinding) -> Result<Agent, AgentError> {
        let provider = create_provider(
            &self.config.region,
            self.bearer_token.clone(),
            Arc::clone(&self.credentials),
        )?;
        let memory = AgentCoreMemoryClient::new(
            Arc::clone(&self.credentials),
            &self.config.region,
            self.config.endpoint_url.as_deref(),
        )?;

        let memory_config =
            MemoryConfig::for_actor(&binding.memory_id, &binding.actor_id, &binding.session_id);
        tracing::debug!(
            namespaces = ?memory_config.retrieval.keys().collect::<Vec<_>>(),
            region = %memory.region(),
            "Configured memory session"
        );

        Ok(Agent::new(
            AgentConfig::new(self.config.model_id.clone()),
            provider,
            MemorySessionManager::new(memory_config, BoxMemoryClient::new(memory)),
            ToolRegistry::with_defaults(),
        ))
    }
}
