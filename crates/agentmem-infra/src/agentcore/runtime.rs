//! AgentCoreRuntimeClient -- [`AgentRuntimeInvoker`] over InvokeAgentRuntime.
//!
//! The runtime's response body is streamed; chunks are reassembled before
//! the body is decoded as UTF-8 and parsed as JSON.

use std::fmt::Display;
use std::sync::Arc;

use futures_util::{Stream, StreamExt};

use agentmem_core::runtime::invoker::AgentRuntimeInvoker;
use agentmem_types::error::RuntimeError;
use agentmem_types::invocation::CUSTOM_ACTOR_HEADER;
use agentmem_types::runtime::{AgentRuntimeArn, RuntimeInvocation, SESSION_ID_HEADER};

use super::DataPlane;
use crate::aws::CredentialsProvider;
use crate::aws::sigv4::uri_encode;

/// Runtime client for one region.
#[derive(Debug, Clone)]
pub struct AgentCoreRuntimeClient {
    plane: DataPlane,
}

impl AgentCoreRuntimeClient {
    pub fn new(
        credentials: Arc<CredentialsProvider>,
        region: &str,
        endpoint: Option<&str>,
    ) -> Result<Self, RuntimeError> {
        Ok(Self {
            plane: DataPlane::new(credentials, region, endpoint).map_err(RuntimeError::Request)?,
        })
    }

    pub fn region(&self) -> &str {
        self.plane.region()
    }
}

impl AgentRuntimeInvoker for AgentCoreRuntimeClient {
    async fn invoke(
        &self,
        runtime: &AgentRuntimeArn,
        invocation: &RuntimeInvocation,
    ) -> Result<serde_json::Value, RuntimeError> {
        let path = format!(
            "/runtimes/{}/invocations?qualifier={}",
            uri_encode(runtime.as_str(), true),
            uri_encode(&invocation.qualifier, true),
        );
        let body = serde_json::to_vec(&invocation.payload)
            .map_err(|e| RuntimeError::Request(e.to_string()))?;

        let mut headers = vec![(SESSION_ID_HEADER, invocation.session_id.as_str())];
        if let Some(actor_id) = &invocation.actor_id {
            headers.push((CUSTOM_ACTOR_HEADER, actor_id.as_str()));
        }

        let response = self
            .plane
            .post(&path, body, &headers)
            .await
            .map_err(RuntimeError::Request)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %body, "InvokeAgentRuntime error response");
            return Err(RuntimeError::Service {
                status: status.as_u16(),
                body,
            });
        }

        read_json_body(response.bytes_stream()).await
    }
}

/// Reassemble a chunked body and parse it as JSON.
pub(crate) async fn read_json_body<S, B, E>(chunks: S) -> Result<serde_json::Value, RuntimeError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let mut chunks = std::pin::pin!(chunks);
    let mut buf = Vec::new();
    let mut count = 0usize;
    while let Some(chunk) = chunks.next().await {
        let chunk = chunk.map_err(|e| RuntimeError::Stream(e.to_string()))?;
        buf.extend_from_slice(chunk.as_ref());
        count += 1;
    }
    tracing::debug!(chunks = count, bytes = buf.len(), "Runtime response reassembled");

    let text = String::from_utf8(buf).map_err(|_| RuntimeError::InvalidUtf8)?;
    serde_json::from_str(&text).map_err(|e| RuntimeError::InvalidJson(e.to_string()))
}
