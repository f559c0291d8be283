//! Managed memory integration for agentmem.
//!
//! This module defines the `MemoryClient` trait that the infrastructure layer
//! implements against the AgentCore Memory data plane, and the
//! `MemorySessionManager` that binds a client to one (memory, actor, session)
//! triple for the lifetime of an agent.

pub mod box_client;
pub mod client;
pub mod session;
