//! Application error type mapping to HTTP status codes.
//!
//! Every failure is rendered as `{"error": message}`, the same shape the
//! runtime uses for configuration errors.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use agentmem_types::error::AgentError;

#[derive(Debug)]
pub enum AppError {
    /// The request body is not a valid invocation payload.
    InvalidPayload(String),
    /// The agent failed to build or answer.
    Agent(AgentError),
}

impl From<AgentError> for AppError {
    fn from(e: AgentError) -> Self {
        AppError::Agent(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidPayload(msg) => (
                StatusCode::BAD_REQUEST,
                format!("Invalid invocation payload: {msg}"),
            ),
            AppError::Agent(e) => {
                error!(error = %e, "Invocation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
