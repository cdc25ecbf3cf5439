//! Tool traits, typed tool adapter, and closure-based tool wrapper.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use super::arguments::ToolArguments;
use super::types::AgentToolParameters;
use crate::error::DocentError;

/// Extras key under which tools publish image URLs.
pub const IMAGES_KEY: &str = "images";

/// Context available during tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolExecutionContext {
    /// Id of the tool call being served.
    pub tool_call_id: String,
    /// Language of the current turn.
    pub language: String,
}

/// Result of a tool invocation: text for the model plus auxiliary payload.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToolOutput {
    pub content: String,
    extras: serde_json::Map<String, serde_json::Value>,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            extras: serde_json::Map::new(),
        }
    }

    /// Attach an auxiliary value.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extras.insert(key.into(), value);
        self
    }

    /// Attach image URLs.
    pub fn with_images(self, images: Vec<String>) -> Self {
        self.with_extra(IMAGES_KEY, serde_json::Value::from(images))
    }

    pub fn extra(&self, key: &str) -> Option<&serde_json::Value> {
        self.extras.get(key)
    }

    /// Image URLs the tool surfaced, if any.
    pub fn images(&self) -> Option<Vec<String>> {
        let list = self.extras.get(IMAGES_KEY)?.as_array()?;
        Some(
            list.iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
        )
    }
}

/// Core tool trait. Object-safe so the registry can hold heterogeneous tools.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name (must match what the model calls).
    fn name(&self) -> &str;

    /// Human-readable description.
    fn description(&self) -> &str;

    /// Parameter contract.
    fn parameters(&self) -> &AgentToolParameters;

    /// Execute the tool with already-validated arguments.
    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<ToolOutput, DocentError>;
}

/// A tool whose arguments decode into a dedicated struct.
///
/// Register through [`Typed`] (or `ToolRegistry::register_typed`), which owns
/// the parameter contract and performs the decoding.
#[async_trait]
pub trait TypedTool: Send + Sync + 'static {
    type Args: DeserializeOwned + Send;

    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Parameter contract matching the fields of `Args`.
    fn parameters(&self) -> AgentToolParameters;

    async fn call(&self, args: Self::Args, ctx: &ToolExecutionContext) -> Result<ToolOutput, DocentError>;
}

/// Adapter exposing a [`TypedTool`] as a [`Tool`].
pub struct Typed<T: TypedTool> {
    inner: T,
    parameters: AgentToolParameters,
}

impl<T: TypedTool> Typed<T> {
    pub fn new(inner: T) -> Self {
        let parameters = inner.parameters();
        Self { inner, parameters }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: TypedTool> Tool for Typed<T> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<ToolOutput, DocentError> {
        let typed: T::Args = args.deserialize().map_err(|e| DocentError::ToolExecution {
            tool_name: self.inner.name().to_string(),
            message: e.to_string(),
        })?;
        self.inner.call(typed, ctx).await
    }
}

/// Type alias for the tool handler function.
type ToolHandler = dyn Fn(
        ToolArguments,
        ToolExecutionContext,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput, DocentError>> + Send>>
    + Send
    + Sync;

/// Closure-based tool for quick tool creation.
pub struct AgentTool {
    name: String,
    description: String,
    parameters: AgentToolParameters,
    handler: Arc<ToolHandler>,
}

impl AgentTool {
    /// Create a tool from a closure.
    pub fn new<F, Fut>(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: AgentToolParameters,
        handler: F,
    ) -> Self
    where
        F: Fn(ToolArguments, ToolExecutionContext) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolOutput, DocentError>> + Send + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            handler: Arc::new(move |args, ctx| Box::pin(handler(args, ctx))),
        }
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters(&self) -> &AgentToolParameters {
        &self.parameters
    }

    async fn execute(
        &self,
        args: &ToolArguments,
        ctx: &ToolExecutionContext,
    ) -> Result<ToolOutput, DocentError> {
        (self.handler)(args.clone(), ctx.clone()).await
    }
}

impl std::fmt::Debug for AgentTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentTool")
            .field("name", &self.name)
            .field("description", &self.description)
            .finish()
    }
}
