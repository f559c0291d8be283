//! Shared domain types for agentmem.
//!
//! This crate contains the types shared by the runtime entry handler and the
//! smoke-test driver: invocation payloads, model conversation shapes, memory
//! events and records, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod agent;
pub mod config;
pub mod error;
pub mod invocation;
pub mod llm;
pub mod memory;
pub mod runtime;
