//! Runtime entry handler.
//!
//! `InvocationHandler` owns the process's single agent. The agent is built on
//! the first invocation that passes the configuration check, through the
//! injected [`AgentFactory`], and reused by every later invocation. One
//! process serves one session; a later call with a different binding is
//! answered by the existing agent and logged.

use tokio::sync::OnceCell;
use tracing::{info, warn};

use agentmem_types::config::RuntimeConfig;
use agentmem_types::error::AgentError;
use agentmem_types::invocation::{
    CUSTOM_ACTOR_HEADER, InvocationPayload, InvocationResponse, RequestContext,
};

use crate::agent::{AgentBinding, AgentFactory, InvokeAgent};

struct BoundAgent<A> {
    binding: AgentBinding,
    agent: A,
}

/// Entry handler for runtime invocations.
pub struct InvocationHandler<F: AgentFactory> {
    config: RuntimeConfig,
    factory: F,
    agent: OnceCell<BoundAgent<F::Agent>>,
}

impl<F: AgentFactory> InvocationHandler<F> {
    pub fn new(config: RuntimeConfig, factory: F) -> Self {
        Self {
            config,
            factory,
            agent: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Whether the agent has been constructed yet.
    pub fn is_initialized(&self) -> bool {
        self.agent.initialized()
    }

    /// Answer one invocation.
    ///
    /// A missing memory id yields an error-shaped response, not an `Err`.
    /// Model, memory and construction failures propagate.
    pub async fn handle(
        &self,
        payload: InvocationPayload,
        context: RequestContext,
    ) -> Result<InvocationResponse, AgentError> {
        info!(?payload, "Payload");
        info!(session_id = ?context.session_id, "Context");

        let Some(memory_id) = self.config.memory_id.as_deref() else {
            return Ok(InvocationResponse::memory_not_configured());
        };

        match &context.request_headers {
            Some(headers) if !headers.is_empty() => {
                info!(?headers, "Request headers");
                info!(
                    header = CUSTOM_ACTOR_HEADER,
                    actor_id = ?context.header(CUSTOM_ACTOR_HEADER),
                    "Actor ID extracted from header"
                );
            }
            _ => warn!("No request headers found in context"),
        }

        if context.session_id.is_none() {
            warn!("No session id in context; using the default session");
        }

        let binding = AgentBinding {
            memory_id: memory_id.to_string(),
            actor_id: context.actor_id().to_string(),
            session_id: context.session_id_or_default().to_string(),
        };
        info!(
            actor_id = %binding.actor_id,
            session_id = %binding.session_id,
            "Using actor and session"
        );

        let bound = self
            .agent
            .get_or_try_init(|| async {
                info!(
                    actor_id = %binding.actor_id,
                    session_id = %binding.session_id,
                    model = %self.config.model_id,
                    "Creating agent"
                );
                let agent = self.factory.create(&binding).await?;
                Ok::<_, AgentError>(BoundAgent {
                    binding: binding.clone(),
                    agent,
                })
            })
            .await?;

        if bound.binding != binding {
            warn!(
                bound_actor = %bound.binding.actor_id,
                bound_session = %bound.binding.session_id,
                actor_id = %binding.actor_id,
                session_id = %binding.session_id,
                "Invocation for a different binding is served by the existing agent"
            );
        }

        let result = bound.agent.invoke(payload.effective_prompt()).await?;
        let text = match result.first_text() {
            Some(text) => text.to_string(),
            None => result.to_string(),
        };
        Ok(InvocationResponse::Response(text))
    }
}
