//! Runtime configuration read from the environment.
//!
//! `RuntimeConfig` is resolved through a lookup closure so callers (and tests)
//! never have to mutate the process environment.

use serde::{Deserialize, Serialize};

use crate::agent::DEFAULT_MODEL_ID;

pub const MEMORY_ID_VAR: &str = "BEDROCK_AGENTCORE_MEMORY_ID";
pub const REGION_VAR: &str = "AWS_REGION";
pub const MODEL_ID_VAR: &str = "MODEL_ID";
pub const ENDPOINT_URL_VAR: &str = "AGENTMEM_ENDPOINT_URL";

/// Region used by the entry handler when `AWS_REGION` is unset.
pub const DEFAULT_REGION: &str = "us-west-2";

/// Settings for the runtime entry handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Memory resource id. `None` makes every invocation return the
    /// "memory not configured" error.
    pub memory_id: Option<String>,
    pub region: String,
    pub model_id: String,
    /// Override for the AgentCore data-plane endpoint.
    #[serde(default)]
    pub endpoint_url: Option<String>,
}

impl RuntimeConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|value| !value.is_empty());
        Self {
            memory_id: get(MEMORY_ID_VAR),
            region: get(REGION_VAR).unwrap_or_else(|| DEFAULT_REGION.to_string()),
            model_id: get(MODEL_ID_VAR).unwrap_or_else(|| DEFAULT_MODEL_ID.to_string()),
            endpoint_url: get(ENDPOINT_URL_VAR),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
