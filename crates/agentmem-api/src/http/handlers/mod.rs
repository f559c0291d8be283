//! HTTP request handlers for the runtime contract.

pub mod invocations;
pub mod ping;
