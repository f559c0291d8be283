//! Invocation endpoint called by the hosting runtime.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;

use agentmem_core::agent::AgentFactory;
use agentmem_types::invocation::{InvocationPayload, InvocationResponse, RequestContext};
use agentmem_types::runtime::SESSION_ID_HEADER;

use crate::http::error::AppError;
use crate::state::AppState;

/// Forwarded headers carry this prefix (lower-cased by the HTTP stack).
const CUSTOM_HEADER_PREFIX: &str = "x-amzn-bedrock-agentcore-runtime-custom-";

/// POST /invocations
pub async fn invoke<F: AgentFactory + 'static>(
    State(state): State<AppState<F>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<InvocationResponse>, AppError> {
    if state.handler.config().memory_id.is_none() {
        return Ok(Json(InvocationResponse::memory_not_configured()));
    }
    let payload = parse_payload(&body)?;
    let context = request_context(&headers);
    let response = state.handler.handle(payload, context).await?;
    Ok(Json(response))
}

/// An empty body is the empty payload.
fn parse_payload(body: &[u8]) -> Result<InvocationPayload, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(InvocationPayload::default());
    }
    serde_json::from_slice(body).map_err(|e| AppError::InvalidPayload(e.to_string()))
}

fn request_context(headers: &HeaderMap) -> RequestContext {
    let mut context = RequestContext::default();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        let name = name.as_str();
        if name.eq_ignore_ascii_case(SESSION_ID_HEADER) {
            if !value.is_empty() {
                context.session_id = Some(value.to_string());
            }
        } else if name.starts_with(CUSTOM_HEADER_PREFIX) || name == "authorization" {
            context = context.with_header(name, value);
        }
    }
    context
}
