//! AWS request authentication.
//!
//! Two schemes are supported: Bedrock API keys sent as a bearer token, and
//! SigV4 with credentials from [`CredentialsProvider`] (environment, shared
//! profile files, container endpoint or instance metadata).

pub mod credentials;
pub mod profile;
pub mod sigv4;

use std::sync::Arc;

use chrono::Utc;
use reqwest::{RequestBuilder, Url};
use secrecy::{ExposeSecret, SecretString};

pub use credentials::{AwsCredentials, BEARER_TOKEN_VAR, CredentialsProvider};

/// How requests to one AWS service are authenticated.
#[derive(Debug, Clone)]
pub enum AwsAuth {
    Bearer(SecretString),
    SigV4(Arc<CredentialsProvider>),
}

/// Authenticates requests for one service in one region.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    auth: AwsAuth,
    region: String,
    service: &'static str,
}

impl RequestSigner {
    pub fn new(auth: AwsAuth, region: impl Into<String>, service: &'static str) -> Self {
        Self {
            auth,
            region: region.into(),
            service,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Attach authentication headers for a request with this method, URL
    /// and body.
    pub async fn authorize(
        &self,
        request: RequestBuilder,
        method: &str,
        url: &Url,
        body: &[u8],
    ) -> Result<RequestBuilder, String> {
        match &self.auth {
            AwsAuth::Bearer(token) => Ok(request.bearer_auth(token.expose_secret())),
            AwsAuth::SigV4(provider) => {
                let credentials = provider.credentials().await?;
                let params = sigv4::SigningParams {
                    credentials: &credentials,
                    region: &self.region,
                    service: self.service,
                    time: Utc::now(),
                };
                let headers = sigv4::sign(method, url, body, &params)?;
                Ok(headers
                    .into_iter()
                    .fold(request, |request, (name, value)| request.header(name, value)))
            }
        }
    }
}
