//! Agent loop, memory integration and smoke-test logic for agentmem.
//!
//! This crate defines the "ports" (provider, memory client and runtime
//! invoker traits) that the infrastructure layer implements. It depends on
//! `agentmem-types` and the span names in `agentmem-observe` -- never on
//! `agentmem-infra` or any HTTP crate.

pub mod agent;
pub mod handler;
pub mod llm;
pub mod memory;
pub mod runtime;
pub mod tools;

#[cfg(test)]
mod testing;
