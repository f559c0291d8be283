//! BedrockProvider -- concrete [`LlmProvider`] implementation for AWS Bedrock.
//!
//! Calls the Bedrock Runtime Converse API. Requests are authenticated
//! either with a Bedrock API key (Bearer token) or with SigV4 credentials.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is never logged
//! or included in `Debug` output.

use std::time::Duration;

use reqwest::Url;
use secrecy::{ExposeSecret, SecretString};

use agentmem_core::llm::provider::LlmProvider;
use agentmem_types::llm::{ConverseRequest, ConverseResponse, LlmError, StopReason, Usage};

use super::types::{BedrockConverseRequest, BedrockConverseResponse};
use crate::aws::sigv4::uri_encode;
use crate::aws::{AwsAuth, RequestSigner};

/// SigV4 service name for Bedrock Runtime.
const SERVICE: &str = "bedrock";

/// AWS Bedrock Converse provider.
///
/// # API Key Security
///
/// Bearer tokens are stored as [`SecretString`] and only exposed when
/// constructing HTTP request headers.
pub struct BedrockProvider {
    client: reqwest::Client,
    signer: RequestSigner,
    endpoint: String,
}

impl BedrockProvider {
    /// Prefix used to identify Bedrock API keys.
    const KEY_PREFIX: &'static str = "bedrock-api-key-";

    /// Create a provider authenticating with `auth` in `region`.
    pub fn new(auth: AwsAuth, region: String) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;
        let endpoint = format!("https://bedrock-runtime.{region}.amazonaws.com");

        Ok(Self {
            client,
            signer: RequestSigner::new(auth, region, SERVICE),
            endpoint,
        })
    }

    /// Create a provider from a Bedrock API key.
    ///
    /// If the key starts with `bedrock-api-key-`, the prefix is stripped and
    /// the remainder is used as the Bearer token. The token is a
    /// base64-encoded presigned URL; if its credential scope names a region,
    /// that region is used instead of `region`.
    pub fn with_api_key(api_key: SecretString, region: String) -> Result<Self, LlmError> {
        let raw_key = api_key.expose_secret();
        let token_part = raw_key.strip_prefix(Self::KEY_PREFIX).unwrap_or(raw_key);
        let effective_region = Self::detect_region_from_token(token_part).unwrap_or(region);
        let bearer_token = SecretString::from(token_part.to_string());

        Self::new(AwsAuth::Bearer(bearer_token), effective_region)
    }

    /// Send requests to `endpoint` instead of the regional Bedrock Runtime
    /// host.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn region(&self) -> &str {
        self.signer.region()
    }

    /// Try to extract the AWS region from a base64-encoded presigned URL token.
    ///
    /// The token decodes to a URL like:
    /// `bedrock.amazonaws.com/?...&X-Amz-Credential=AKIA.../20260212/us-east-1/bedrock/aws4_request&...`
    fn detect_region_from_token(token: &str) -> Option<String> {
        use base64::Engine;
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(token)
            .ok()?;
        let text = String::from_utf8(decoded).ok()?;

        let cred_start = text.find("X-Amz-Credential=")?;
        let cred_value = &text[cred_start + "X-Amz-Credential=".len()..];
        // <access-key>/<date>/<region>/<service>/aws4_request, possibly %2F-encoded
        let cred_value = cred_value.replace("%2F", "/");
        let parts: Vec<&str> = cred_value.split('/').collect();
        if parts.len() >= 3 {
            let region = parts[2].split('&').next().unwrap_or(parts[2]);
            tracing::info!(region = %region, "Detected region from Bedrock bearer token");
            Some(region.to_string())
        } else {
            None
        }
    }

    /// Convert a bare Claude model name to a Bedrock inference profile ID.
    ///
    /// Models that already contain a `.` (`us.anthropic.claude-...`,
    /// `anthropic.claude-...`) are returned as-is; otherwise the region's
    /// shorthand prefix is added.
    ///
    /// ```text
    /// ("claude-3-7-sonnet-20250219", "eu-west-1") → "eu.anthropic.claude-3-7-sonnet-20250219-v1:0"
    /// ("us.anthropic.claude-3-7-sonnet-20250219-v1:0", _) → unchanged
    /// ```
    pub fn to_bedrock_model_id(model: &str, region: &str) -> String {
        if model.contains('.') {
            model.to_string()
        } else {
            let region_prefix = region.split('-').next().unwrap_or("us");
            format!("{region_prefix}.anthropic.{model}-v1:0")
        }
    }

    /// Build the Converse URL for `model`.
    fn url(&self, model: &str) -> String {
        let model_id = Self::to_bedrock_model_id(model, self.region());
        format!("{}/model/{}/converse", self.endpoint, uri_encode(&model_id, true))
    }
}

// BedrockProvider intentionally does NOT derive Debug to prevent
// accidental exposure of internal state.

impl LlmProvider for BedrockProvider {
    fn name(&self) -> &str {
        "bedrock"
    }

    async fn converse(&self, request: &ConverseRequest) -> Result<ConverseResponse, LlmError> {
        let body = serde_json::to_vec(&BedrockConverseRequest::from(request))
            .map_err(|e| LlmError::InvalidRequest(e.to_string()))?;
        let url = Url::parse(&self.url(&request.model))
            .map_err(|e| LlmError::InvalidRequest(format!("invalid Bedrock URL: {e}")))?;

        tracing::debug!(url = %url, region = %self.region(), "Bedrock converse request");

        let builder = self
            .client
            .post(url.clone())
            .header("Content-Type", "application/json");
        let builder = self
            .signer
            .authorize(builder, "POST", &url, &body)
            .await
            .map_err(LlmError::AuthenticationFailed)?;

        let response = builder.body(body).send().await.map_err(|e| LlmError::Provider {
            message: format!("HTTP request failed: {e}"),
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            tracing::warn!(status = %status, body = %error_body, url = %url, "Bedrock API error response");
            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthenticationFailed(format!(
                    "Bedrock authentication failed (HTTP {status}): {error_body}"
                )),
                429 => LlmError::RateLimited {
                    retry_after_ms: None,
                },
                400 => LlmError::InvalidRequest(error_body),
                s if s >= 500 => LlmError::Provider {
                    message: format!("Bedrock server error HTTP {status}: {error_body}"),
                },
                _ => LlmError::Provider {
                    message: format!("HTTP {status}: {error_body}"),
                },
            });
        }

        let bedrock_resp: BedrockConverseResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Deserialization(format!("failed to parse response: {e}")))?;

        let stop_reason = bedrock_resp
            .stop_reason
            .parse()
            .unwrap_or(StopReason::EndTurn);

        Ok(ConverseResponse {
            message: bedrock_resp.output.message.into_domain(),
            stop_reason,
            usage: Usage {
                input_tokens: bedrock_resp.usage.input_tokens,
                output_tokens: bedrock_resp.usage.output_tokens,
            },
        })
    }
}
