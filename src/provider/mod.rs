//! Language-model provider trait and the chat-completions implementation.

pub mod azure;
pub mod http;
pub mod openai;

use async_trait::async_trait;

use crate::error::DocentError;
use crate::types::{AgentToolCall, FinishReason, GenerationSettings, ModelMessage, Usage};

pub use azure::AzureOpenAiProvider;
pub use openai::OpenAiProvider;

/// A request sent to a model provider.
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub messages: Vec<ModelMessage>,
    pub settings: GenerationSettings,
    pub tools: Option<Vec<ToolDefinition>>,
}

/// Tool definition sent to the provider API.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// Response from a provider: one assistant message plus its finish reason.
#[derive(Debug, Clone, Default)]
pub struct ProviderResponse {
    pub text: String,
    pub usage: Usage,
    pub tool_calls: Vec<AgentToolCall>,
    pub finish_reason: Option<FinishReason>,
}

impl ProviderResponse {
    /// Whether the model's output was blocked by content policy.
    pub fn is_content_filtered(&self) -> bool {
        self.finish_reason == Some(FinishReason::ContentFilter)
    }
}

/// Core trait implemented by language-model completion services.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name (e.g., "azure-openai").
    fn provider_name(&self) -> &str;

    /// The model or deployment this provider instance serves.
    fn model_id(&self) -> &str;

    /// Request a single (non-streaming) completion.
    async fn generate_text(&self, request: &ProviderRequest)
        -> Result<ProviderResponse, DocentError>;
}
