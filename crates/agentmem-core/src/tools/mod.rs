//! Tools the agent can offer to the model.
//!
//! A [`Tool`] advertises a [`ToolSpec`] and executes synchronously against the
//! JSON input the model produced. [`ToolRegistry`] dispatches by name.

pub mod calculator;

use agentmem_types::error::ToolError;
use agentmem_types::llm::ToolSpec;

pub use calculator::CalculatorTool;

/// A model-callable tool.
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;

    /// Execute with the model-provided input, returning text for the model.
    fn call(&self, input: &serde_json::Value) -> Result<String, ToolError>;
}

/// Name-indexed set of tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the default tool set (calculator).
    pub fn with_defaults() -> Self {
        Self::new().with(CalculatorTool::new())
    }

    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(Box::new(tool));
        self
    }

    pub fn specs(&self) -> Vec<ToolSpec> {
        self.tools.iter().map(|tool| tool.spec()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn call(&self, name: &str, input: &serde_json::Value) -> Result<String, ToolError> {
        let tool = self
            .tools
            .iter()
            .find(|tool| tool.spec().name == name)
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        tool.call(input)
    }
}
