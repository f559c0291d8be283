//! Memory-backed conversational agent.
//!
//! - `Agent`: runs the model/tool loop and records turns in managed memory
//! - `SystemPromptBuilder`: appends recalled long-term records to the system prompt
//! - `AgentFactory` / `InvokeAgent`: the seam the entry handler builds agents through

pub mod engine;
pub mod factory;
pub mod prompt;

pub use engine::Agent;
pub use factory::{AgentBinding, AgentFactory, InvokeAgent};
