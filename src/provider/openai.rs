//! OpenAI Chat Completions API provider.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use tracing::debug;

use crate::error::DocentError;
use crate::types::*;

use super::http::{bearer_headers, check_status, shared_client};
use super::{ModelProvider, ProviderRequest, ProviderResponse};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    name: String,
    model: String,
    url: String,
    headers: HeaderMap,
    /// Whether the request body names the model (deployment URLs already do).
    send_model: bool,
}

impl OpenAiProvider {
    pub fn new(model: impl Into<String>, api_key: &str, base_url: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            name: "openai".to_string(),
            model: model.into(),
            url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            headers: bearer_headers(api_key),
            send_model: true,
        }
    }

    /// Build a provider that posts to a fully-qualified completions URL.
    pub(crate) fn with_endpoint(
        name: impl Into<String>,
        model: impl Into<String>,
        url: String,
        headers: HeaderMap,
    ) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            url,
            headers,
            send_model: false,
        }
    }

    pub(crate) fn build_request_body(&self, request: &ProviderRequest) -> serde_json::Value {
        let messages = request
            .messages
            .iter()
            .map(message_to_openai)
            .collect::<Vec<_>>();

        let mut body = serde_json::json!({ "messages": messages });
        let Some(obj) = body.as_object_mut() else {
            return body;
        };

        if self.send_model {
            obj.insert("model".into(), self.model.clone().into());
        }
        if let Some(max) = request.settings.max_tokens {
            obj.insert("max_tokens".into(), max.into());
        }
        if let Some(temp) = request.settings.temperature {
            obj.insert("temperature".into(), temp.into());
        }

        if let Some(ref tools) = request.tools {
            if !tools.is_empty() {
                let tool_defs: Vec<serde_json::Value> = tools
                    .iter()
                    .map(|t| {
                        serde_json::json!({
                            "type": "function",
                            "function": {
                                "name": t.name,
                                "description": t.description,
                                "parameters": t.parameters,
                            }
                        })
                    })
                    .collect();
                obj.insert("tools".into(), tool_defs.into());
                if let Some(choice) = request.settings.tool_choice {
                    obj.insert("tool_choice".into(), choice.to_string().into());
                }
            }
        }

        body
    }
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn provider_name(&self) -> &str {
        &self.name
    }

    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate_text(&self, request: &ProviderRequest) -> Result<ProviderResponse, DocentError> {
        let body = self.build_request_body(request);

        debug!(provider = %self.name, model = %self.model, messages = request.messages.len(), "chat completion");

        let resp = shared_client()
            .post(&self.url)
            .headers(self.headers.clone())
            .json(&body)
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let data: OpenAiChatResponse = resp.json().await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DocentError::api(200, "No choices in chat completion response"))?;

        let tool_calls = choice
            .message
            .tool_calls
            .unwrap_or_default()
            .into_iter()
            .map(|tc| AgentToolCall {
                id: tc.id,
                name: tc.function.name,
                arguments: serde_json::from_str(&tc.function.arguments)
                    .unwrap_or(serde_json::Value::String(tc.function.arguments)),
            })
            .collect();

        let finish_reason = choice.finish_reason.as_deref().and_then(FinishReason::parse);

        Ok(ProviderResponse {
            text: choice.message.content.unwrap_or_default(),
            usage: data
                .usage
                .map(|u| Usage {
                    input_tokens: u.prompt_tokens,
                    output_tokens: u.completion_tokens,
                    total_tokens: u.total_tokens,
                })
                .unwrap_or_default(),
            tool_calls,
            finish_reason,
        })
    }
}

fn message_to_openai(msg: &ModelMessage) -> serde_json::Value {
    let role = msg.role.to_string();

    if let Some(ContentPart::ToolResult(tr)) = msg.content.first() {
        let mut value = serde_json::json!({
            "role": "tool",
            "tool_call_id": tr.tool_call_id,
            "content": tr.content,
        });
        if let (Some(name), Some(obj)) = (&msg.name, value.as_object_mut()) {
            obj.insert("name".into(), name.clone().into());
        }
        return value;
    }

    let tool_calls = msg.tool_calls();
    if !tool_calls.is_empty() {
        let tc_json: Vec<serde_json::Value> = tool_calls
            .iter()
            .map(|tc| {
                let arguments = match &tc.arguments {
                    serde_json::Value::String(raw) => raw.clone(),
                    other => other.to_string(),
                };
                serde_json::json!({
                    "id": tc.id,
                    "type": "function",
                    "function": {
                        "name": tc.name,
                        "arguments": arguments,
                    }
                })
            })
            .collect();
        let text = msg.text();
        return serde_json::json!({
            "role": role,
            "content": if text.is_empty() { serde_json::Value::Null } else { serde_json::Value::String(text) },
            "tool_calls": tc_json,
        });
    }

    serde_json::json!({ "role": role, "content": msg.text() })
}

// Chat Completions response types (internal)

#[derive(Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChoice>,
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    content: Option<String>,
    tool_calls: Option<Vec<OpenAiToolCall>>,
}

#[derive(Deserialize)]
struct OpenAiToolCall {
    id: String,
    function: OpenAiFunction,
}

#[derive(Deserialize)]
struct OpenAiFunction {
    name: String,
    arguments: String,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}
