//! Axum router for the runtime contract.
//!
//! Routes: `POST /invocations`, `GET /ping`. Middleware: tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use agentmem_core::agent::AgentFactory;

use crate::http::handlers;
use crate::state::AppState;

/// Build the router with all routes and middleware.
pub fn build_router<F: AgentFactory + 'static>(state: AppState<F>) -> Router {
    Router::new()
        .route("/invocations", post(handlers::invocations::invoke::<F>))
        .route("/ping", get(handlers::ping::ping::<F>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use axum::http::{HeaderName, HeaderValue, StatusCode};
    use axum_test::TestServer;
    use serde_json::{Value, json};

    use agentmem_core::agent::{AgentBinding, InvokeAgent};
    use agentmem_core::handler::InvocationHandler;
    use agentmem_types::agent::AgentResult;
    use agentmem_types::config::RuntimeConfig;
    use agentmem_types::error::AgentError;
    use agentmem_types::llm::{LlmError, Message, StopReason, Usage};

    const SESSION: &str = "x-amzn-bedrock-agentcore-runtime-session-id";
    const ACTOR: &str = "x-amzn-bedrock-agentcore-runtime-custom-actor-id";

    struct EchoAgent {
        fail: bool,
    }

    impl InvokeAgent for EchoAgent {
        async fn invoke(&self, prompt: &str) -> Result<AgentResult, AgentError> {
            if self.fail {
                return Err(AgentError::Llm(LlmError::Provider {
                    message: "model unavailable".into(),
                }));
            }
            Ok(AgentResult {
                message: Message::assistant(format!("echo: {prompt}")),
                stop_reason: StopReason::EndTurn,
                usage: Usage::default(),
            })
        }
    }

    /// Builds echo agents and records every binding it was asked for.
    #[derive(Clone, Default)]
    struct EchoFactory {
        bindings: Arc<Mutex<Vec<AgentBinding>>>,
        fail: bool,
    }

    impl AgentFactory for EchoFactory {
        type Agent = EchoAgent;

        async fn create(&self, binding: &AgentBinding) -> Result<EchoAgent, AgentError> {
            self.bindings.lock().unwrap().push(binding.clone());
            Ok(EchoAgent { fail: self.fail })
        }
    }

    fn server(memory_id: Option<&str>, factory: EchoFactory) -> (TestServer, AppState<EchoFactory>) {
        let config = RuntimeConfig {
            memory_id: memory_id.map(str::to_string),
            ..RuntimeConfig::default()
        };
        let state = AppState::new(InvocationHandler::new(config, factory));
        let server = TestServer::new(build_router(state.clone())).expect("test server");
        (server, state)
    }

    fn header(name: &'static str, value: &'static str) -> (HeaderName, HeaderValue) {
        (HeaderName::from_static(name), HeaderValue::from_static(value))
    }

    #[tokio::test]
    async fn test_missing_memory_id_returns_error_body() {
        let factory = EchoFactory::default();
        let (server, _) = server(None, factory.clone());

        let response = server
            .post("/invocations")
            .json(&json!({"prompt": "Hello!"}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "error": "Memory not configured. Set BEDROCK_AGENTCORE_MEMORY_ID environment variable."
        }));
        assert!(factory.bindings.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_memory_id_checked_before_payload() {
        let factory = EchoFactory::default();
        let (server, _) = server(None, factory.clone());

        let response = server.post("/invocations").text("{not json").await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "error": "Memory not configured. Set BEDROCK_AGENTCORE_MEMORY_ID environment variable."
        }));
        assert!(factory.bindings.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invocation_binds_session_and_actor_headers() {
        let factory = EchoFactory::default();
        let (server, _) = server(Some("mem-1"), factory.clone());
        let (session_name, session_value) = header(SESSION, "sess-7");
        let (actor_name, actor_value) = header(ACTOR, "alice");

        let response = server
            .post("/invocations")
            .add_header(session_name, session_value)
            .add_header(actor_name, actor_value)
            .json(&json!({"prompt": "What is 2+2?"}))
            .await;

        response.assert_status_ok();
        response.assert_json(&json!({"response": "echo: What is 2+2?"}));
        let bindings = factory.bindings.lock().unwrap().clone();
        assert_eq!(
            bindings,
            vec![AgentBinding {
                memory_id: "mem-1".into(),
                actor_id: "alice".into(),
                session_id: "sess-7".into(),
            }]
        );
    }

    #[tokio::test]
    async fn test_empty_body_uses_default_prompt() {
        let factory = EchoFactory::default();
        let (server, _) = server(Some("mem-1"), factory.clone());

        let response = server.post("/invocations").await;

        response.assert_status_ok();
        response.assert_json(&json!({"response": "echo: Hello!"}));
        assert_eq!(factory.bindings.lock().unwrap()[0].actor_id, "default-user");
    }

    #[tokio::test]
    async fn test_invalid_json_is_bad_request() {
        let (server, _) = server(Some("mem-1"), EchoFactory::default());

        let response = server.post("/invocations").text("{not json").await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert!(
            body["error"]
                .as_str()
                .unwrap()
                .starts_with("Invalid invocation payload")
        );
    }

    #[tokio::test]
    async fn test_agent_failure_is_server_error() {
        let factory = EchoFactory {
            fail: true,
            ..EchoFactory::default()
        };
        let (server, _) = server(Some("mem-1"), factory);

        let response = server.post("/invocations").json(&json!({})).await;

        response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("model unavailable"));
    }

    #[tokio::test]
    async fn test_agent_reused_across_invocations() {
        let factory = EchoFactory::default();
        let (server, _) = server(Some("mem-1"), factory.clone());

        for _ in 0..3 {
            server
                .post("/invocations")
                .json(&json!({"prompt": "hi"}))
                .await
                .assert_status_ok();
        }

        assert_eq!(factory.bindings.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_ping_reports_healthy() {
        let (server, state) = server(None, EchoFactory::default());

        let response = server.get("/ping").await;

        response.assert_status_ok();
        response.assert_json(&json!({
            "status": "Healthy",
            "time_of_last_update": state.started_at,
        }));
    }
}
