//! HTTP layer implementing the AgentCore runtime contract.
//!
//! `POST /invocations` forwards the payload and request context to the
//! invocation handler; `GET /ping` reports health.

pub mod error;
pub mod handlers;
pub mod router;
