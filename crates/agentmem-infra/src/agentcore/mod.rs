//! Bedrock AgentCore data-plane clients.
//!
//! - [`AgentCoreMemoryClient`]: events and long-term records of a memory resource
//! - [`AgentCoreRuntimeClient`]: invocations of a deployed agent runtime
//!
//! Both talk to `https://bedrock-agentcore.<region>.amazonaws.com` (or the
//! `AGENTMEM_ENDPOINT_URL` override) with SigV4-signed JSON requests.

mod memory;
mod runtime;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;

pub use memory::AgentCoreMemoryClient;
pub use runtime::AgentCoreRuntimeClient;

use crate::aws::{AwsAuth, CredentialsProvider, RequestSigner};

/// SigV4 service name for the AgentCore data plane.
const SERVICE: &str = "bedrock-agentcore";

/// Default data-plane endpoint for `region`.
pub fn data_plane_endpoint(region: &str) -> String {
    format!("https://bedrock-agentcore.{region}.amazonaws.com")
}

/// Signed JSON transport shared by the data-plane clients.
#[derive(Debug, Clone)]
struct DataPlane {
    client: reqwest::Client,
    signer: RequestSigner,
    endpoint: String,
}

impl DataPlane {
    fn new(
        credentials: Arc<CredentialsProvider>,
        region: &str,
        endpoint: Option<&str>,
    ) -> Result<Self, String> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| format!("failed to create HTTP client: {e}"))?;
        let endpoint = endpoint
            .map(|e| e.trim_end_matches('/').to_string())
            .unwrap_or_else(|| data_plane_endpoint(region));
        Ok(Self {
            client,
            signer: RequestSigner::new(AwsAuth::SigV4(credentials), region, SERVICE),
            endpoint,
        })
    }

    fn region(&self) -> &str {
        self.signer.region()
    }

    /// POST `body` to `path_and_query`, signed, with `headers` added.
    async fn post(
        &self,
        path_and_query: &str,
        body: Vec<u8>,
        headers: &[(&str, &str)],
    ) -> Result<reqwest::Response, String> {
        let url = Url::parse(&format!("{}{path_and_query}", self.endpoint))
            .map_err(|e| format!("invalid AgentCore URL: {e}"))?;

        let builder = headers.iter().fold(
            self.client
                .post(url.clone())
                .header("Content-Type", "application/json")
                .header("Accept", "application/json"),
            |builder, (name, value)| builder.header(*name, *value),
        );
        let builder = self.signer.authorize(builder, "POST", &url, &body).await?;

        tracing::debug!(url = %url, "AgentCore request");
        builder
            .body(body)
            .send()
            .await
            .map_err(|e| format!("HTTP request failed: {e}"))
    }
}
