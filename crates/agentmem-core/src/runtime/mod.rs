//! Driving a deployed agent runtime from the outside.
//!
//! - `AgentRuntimeInvoker`: port for calling a runtime (implemented in agentmem-infra)
//! - `PropagationWait`: cancellable wait for asynchronous memory writes
//! - `ShortTermMemoryTest`: the two-turn recall scenario

pub mod invoker;
pub mod smoke;
pub mod wait;
