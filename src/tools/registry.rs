//! Registry of the tools offered to the model.

use std::sync::Arc;

use tracing::debug;

use super::arguments::ToolArguments;
use super::tool::{Tool, ToolExecutionContext, ToolOutput, Typed, TypedTool};
use super::validation::{check_contract, validate_arguments};
use crate::error::DocentError;
use crate::provider::ToolDefinition;

/// Ordered set of uniquely named tools.
///
/// Contracts are checked when a tool is registered, so every tool the model
/// is offered has a well-formed parameter schema.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, rejecting malformed contracts and duplicate names.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<(), DocentError> {
        let name = tool.name();
        if !is_valid_name(name) {
            return Err(DocentError::InvalidArgument(format!(
                "invalid tool name '{name}'"
            )));
        }
        if self.get(name).is_some() {
            return Err(DocentError::InvalidArgument(format!(
                "tool '{name}' is already registered"
            )));
        }
        check_contract(tool.parameters()).map_err(|reason| {
            DocentError::InvalidArgument(format!("tool '{name}': {reason}"))
        })?;
        debug!(tool = name, "registered tool");
        self.tools.push(tool);
        Ok(())
    }

    /// Register a typed tool.
    pub fn register_typed<T: TypedTool>(&mut self, tool: T) -> Result<(), DocentError> {
        self.register(Arc::new(Typed::new(tool)))
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Definitions to advertise to the model, in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters().schema.clone(),
            })
            .collect()
    }

    /// Whether `args` satisfies the named tool's contract.
    pub fn validate(&self, name: &str, args: &serde_json::Value) -> bool {
        self.check(name, args).is_ok()
    }

    /// Like [`validate`](Self::validate) but reports why a call is rejected.
    pub fn check(&self, name: &str, args: &serde_json::Value) -> Result<(), DocentError> {
        let tool = self.get(name).ok_or_else(|| DocentError::ToolRejected {
            tool_name: name.to_string(),
            reason: "unknown tool".to_string(),
        })?;
        validate_arguments(args, tool.parameters()).map_err(|reason| DocentError::ToolRejected {
            tool_name: name.to_string(),
            reason,
        })
    }

    /// Invoke the named tool. Arguments are expected to have passed [`check`](Self::check).
    pub async fn invoke(
        &self,
        name: &str,
        args: serde_json::Value,
        ctx: &ToolExecutionContext,
    ) -> Result<ToolOutput, DocentError> {
        let tool = self.get(name).ok_or_else(|| DocentError::ToolRejected {
            tool_name: name.to_string(),
            reason: "unknown tool".to_string(),
        })?;
        tool.execute(&ToolArguments::new(args), ctx).await
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.tools.iter().map(|t| t.name()))
            .finish()
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 64
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
