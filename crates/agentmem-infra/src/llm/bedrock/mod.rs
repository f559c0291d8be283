//! AWS Bedrock LLM provider implementation.
//!
//! Implements [`LlmProvider`](agentmem_core::llm::provider::LlmProvider)
//! for the Bedrock Runtime Converse API.

mod client;
pub mod types;

pub use client::BedrockProvider;
