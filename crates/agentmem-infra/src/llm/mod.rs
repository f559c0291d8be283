//! LLM provider implementations.
//!
//! Contains the Bedrock implementation of the [`LlmProvider`] trait defined
//! in `agentmem-core`, and a factory ([`create_provider`]) that picks the
//! authentication scheme from the environment.
//!
//! [`LlmProvider`]: agentmem_core::llm::provider::LlmProvider

pub mod bedrock;

use std::sync::Arc;

use secrecy::SecretString;

use agentmem_core::llm::box_provider::BoxLlmProvider;
use agentmem_types::llm::LlmError;

use self::bedrock::BedrockProvider;
use crate::aws::{AwsAuth, BEARER_TOKEN_VAR, CredentialsProvider};

/// Bedrock API key from `AWS_BEARER_TOKEN_BEDROCK`, if set.
pub fn bearer_token_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<SecretString> {
    lookup(BEARER_TOKEN_VAR)
        .filter(|token| !token.trim().is_empty())
        .map(SecretString::from)
}

/// Create the Bedrock provider for `region`.
///
/// A Bedrock API key takes precedence; otherwise requests are SigV4-signed
/// with `credentials`.
pub fn create_provider(
    region: &str,
    bearer_token: Option<SecretString>,
    credentials: Arc<CredentialsProvider>,
) -> Result<BoxLlmProvider, LlmError> {
    let provider = match bearer_token {
        Some(token) => BedrockProvider::with_api_key(token, region.to_string())?,
        None => BedrockProvider::new(AwsAuth::SigV4(credentials), region.to_string())?,
    };
    tracing::debug!(region = %provider.region(), "Created Bedrock provider");
    Ok(BoxLlmProvider::new(provider))
}
