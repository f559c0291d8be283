//! Types for calling a deployed agent runtime.
//!
//! A runtime is addressed by its ARN:
//! `arn:aws:bedrock-agentcore:<region>:<account>:runtime/<runtime-id>`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Qualifier sent with every runtime invocation.
pub const DEFAULT_QUALIFIER: &str = "DEFAULT";

/// Header carrying the runtime session id.
pub const SESSION_ID_HEADER: &str = "X-Amzn-Bedrock-AgentCore-Runtime-Session-Id";

/// Reply text substituted when the runtime response has no `response` field.
pub const NO_RESPONSE: &str = "No response";

/// A parsed agent runtime ARN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentRuntimeArn {
    raw: String,
    region: String,
}

impl AgentRuntimeArn {
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Region taken from the fourth `:`-separated field.
    pub fn region(&self) -> &str {
        &self.region
    }
}

impl FromStr for AgentRuntimeArn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() < 6 || parts[0] != "arn" {
            return Err(format!("invalid agent runtime ARN: '{s}'"));
        }
        let region = parts[3];
        if region.is_empty() {
            return Err(format!("agent runtime ARN has no region: '{s}'"));
        }
        Ok(Self {
            raw: s.to_string(),
            region: region.to_string(),
        })
    }
}

impl fmt::Display for AgentRuntimeArn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

/// One call to a deployed runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeInvocation {
    pub session_id: String,
    pub qualifier: String,
    pub payload: serde_json::Value,
    /// Sent as the custom actor-id header when present.
    pub actor_id: Option<String>,
}

impl RuntimeInvocation {
    pub fn new(session_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            session_id: session_id.into(),
            qualifier: DEFAULT_QUALIFIER.to_string(),
            payload,
            actor_id: None,
        }
    }
}

/// Read the agent reply from a decoded runtime response.
pub fn reply_text(body: &serde_json::Value) -> String {
    match body.get("response") {
        Some(serde_json::Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => NO_RESPONSE.to_string(),
    }
}
