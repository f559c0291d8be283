//! Health check polled by the hosting runtime.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use agentmem_core::agent::AgentFactory;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub time_of_last_update: i64,
}

/// GET /ping
pub async fn ping<F: AgentFactory + 'static>(
    State(state): State<AppState<F>>,
) -> Json<PingResponse> {
    Json(PingResponse {
        status: "Healthy",
        time_of_last_update: state.started_at,
    })
}
