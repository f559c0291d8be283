//! Shared state for the runtime HTTP server.

use std::sync::Arc;

use chrono::Utc;

use agentmem_core::agent::AgentFactory;
use agentmem_core::handler::InvocationHandler;
use agentmem_infra::factory::AgentCoreAgentFactory;
use agentmem_types::config::RuntimeConfig;

/// State handed to every request handler.
///
/// Generic over the agent factory so the router can be exercised with
/// in-process agents.
pub struct AppState<F: AgentFactory> {
    pub handler: Arc<InvocationHandler<F>>,
    /// Unix seconds reported by `/ping` as the last status change.
    pub started_at: i64,
}

impl<F: AgentFactory> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            started_at: self.started_at,
        }
    }
}

impl<F: AgentFactory> AppState<F> {
    pub fn new(handler: InvocationHandler<F>) -> Self {
        Self {
            handler: Arc::new(handler),
            started_at: Utc::now().timestamp(),
        }
    }
}

impl AppState<AgentCoreAgentFactory> {
    /// Build the production state from the process environment.
    pub fn from_env() -> Self {
        let config = RuntimeConfig::from_env();
        let factory = AgentCoreAgentFactory::from_env(config.clone());
        Self::new(InvocationHandler::new(config, factory))
    }
}
