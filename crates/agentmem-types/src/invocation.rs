//! Invocation types exchanged between the hosting runtime and the entry handler.
//!
//! The hosting runtime sends a JSON payload plus a request context (session id
//! and the custom headers it forwarded). The handler answers with either a
//! `response` or an `error` object.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Custom header carrying the caller identity. Header names are lower-cased
/// by the time they reach the handler.
pub const CUSTOM_ACTOR_HEADER: &str = "x-amzn-bedrock-agentcore-runtime-custom-actor-id";

/// Actor id used when the custom header is absent.
pub const DEFAULT_ACTOR_ID: &str = "default-user";

/// Prompt used when the payload carries none.
pub const DEFAULT_PROMPT: &str = "Hello!";

/// Session id used when the runtime did not supply one.
pub const DEFAULT_SESSION_ID: &str = "default-session";

/// Message returned when the memory resource id is missing from the environment.
pub const MEMORY_NOT_CONFIGURED: &str =
    "Memory not configured. Set BEDROCK_AGENTCORE_MEMORY_ID environment variable.";

/// Request payload sent by the hosting runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

impl InvocationPayload {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
        }
    }

    /// The prompt to forward to the agent, falling back to [`DEFAULT_PROMPT`].
    pub fn effective_prompt(&self) -> &str {
        self.prompt.as_deref().unwrap_or(DEFAULT_PROMPT)
    }
}

/// Per-request context supplied by the hosting runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub session_id: Option<String>,
    /// Forwarded headers, keyed by lower-cased name.
    pub request_headers: Option<HashMap<String, String>>,
}

impl RequestContext {
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            request_headers: None,
        }
    }

    /// Attach a header. The name is lower-cased on insert.
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.request_headers
            .get_or_insert_with(HashMap::new)
            .insert(name.to_ascii_lowercase(), value.into());
        self
    }

    /// Look up a header by name, ignoring ASCII case.
    pub fn header(&self, name: &str) -> Option<&str> {
        let headers = self.request_headers.as_ref()?;
        headers
            .get(name)
            .or_else(|| {
                headers
                    .iter()
                    .find(|(key, _)| key.eq_ignore_ascii_case(name))
                    .map(|(_, value)| value)
            })
            .map(String::as_str)
    }

    /// Caller identity from [`CUSTOM_ACTOR_HEADER`], or [`DEFAULT_ACTOR_ID`].
    pub fn actor_id(&self) -> &str {
        self.header(CUSTOM_ACTOR_HEADER)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_ACTOR_ID)
    }

    pub fn session_id_or_default(&self) -> &str {
        self.session_id.as_deref().unwrap_or(DEFAULT_SESSION_ID)
    }
}

/// Handler output: exactly one of `response` or `error`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvocationResponse {
    Response(String),
    Error(String),
}

impl InvocationResponse {
    pub fn memory_not_configured() -> Self {
        InvocationResponse::Error(MEMORY_NOT_CONFIGURED.to_string())
    }

    pub fn is_error(&self) -> bool {
        matches!(self, InvocationResponse::Error(_))
    }
}
