//! Infrastructure layer for agentmem.
//!
//! Contains implementations of the ports defined in `agentmem-core`:
//! the Bedrock Converse provider, the AgentCore Memory and Runtime clients,
//! and the AWS authentication they share (SigV4, Bedrock API keys).

pub mod agentcore;
pub mod aws;
pub mod factory;
pub mod llm;
