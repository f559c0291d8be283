//! Observability for agentmem: subscriber setup and the GenAI semantic
//! convention names used on model and agent spans.

pub mod genai;
pub mod tracing_setup;
