//! Tool-orchestration loop: model calls, content-filter retries, tool rounds.

use std::sync::Arc;

use bon::Builder;
use tracing::{debug, warn};

use crate::config::SearchSettings;
use crate::error::DocentError;
use crate::localization::Localization;
use crate::provider::{ModelProvider, ProviderRequest};
use crate::tools::{ToolExecutionContext, ToolRegistry};
use crate::types::{GenerationSettings, ModelMessage, ToolChoice, Usage};

use super::conversation::Conversation;

/// Appended after a tool round when answers must come from local results only.
pub const GROUNDING_INSTRUCTION: &str = "Only respond truthfully based on the retrieved information. \
Do not add any information that was not provided in the retrieved results.";

/// Budgets for one turn of the loop.
#[derive(Debug, Clone, Builder)]
pub struct LoopSettings {
    /// Token budget before any tool round.
    #[builder(default = 600)]
    pub first_max_tokens: u32,
    /// Token budget once the model has requested tools.
    #[builder(default = 300)]
    pub followup_max_tokens: u32,
    /// Content-filtered responses tolerated per turn before giving up.
    #[builder(default = 3)]
    pub content_filter_retries: u32,
    /// Tool rounds (accepted or abandoned) allowed per turn.
    #[builder(default = 10)]
    pub max_tool_rounds: u32,
    /// Constrain answers to retrieved content after each tool round,
    /// accepted or abandoned.
    #[builder(default)]
    pub grounded_only: bool,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl LoopSettings {
    /// Defaults, grounded when local search is on and internet search is off.
    pub fn for_search(search: &SearchSettings) -> Self {
        Self::builder()
            .grounded_only(search.local_enabled() && !search.internet_enabled())
            .build()
    }
}

/// Final answer of a turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TurnReply {
    pub text: String,
    pub images: Vec<String>,
    /// Tokens spent across every model call of the turn.
    pub usage: Usage,
}

/// Drives a conversation with the model until it answers without tool calls.
pub struct Agent {
    provider: Arc<dyn ModelProvider>,
    tools: ToolRegistry,
    localization: Localization,
    settings: LoopSettings,
}

impl Agent {
    pub fn new(
        provider: Arc<dyn ModelProvider>,
        tools: ToolRegistry,
        localization: Localization,
        settings: LoopSettings,
    ) -> Self {
        Self {
            provider,
            tools,
            localization,
            settings,
        }
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run one turn. Never fails: any error becomes the localized fallback
    /// message with no images.
    pub async fn run_turn(&self, language: &str, conversation: &mut Conversation) -> TurnReply {
        match self.drive(language, conversation).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    error = %e,
                    retryable = e.is_retryable(),
                    language,
                    "turn failed, answering with fallback"
                );
                TurnReply {
                    text: self.localization.fallback(language).to_string(),
                    ..TurnReply::default()
                }
            }
        }
    }

    /// Run one turn, surfacing the error that aborted it.
    pub async fn drive(
        &self,
        language: &str,
        conversation: &mut Conversation,
    ) -> Result<TurnReply, DocentError> {
        let definitions = self.tools.definitions();
        let tools = (!definitions.is_empty()).then_some(definitions);

        let mut images = Vec::new();
        let mut usage = Usage::default();
        let mut filtered = 0u32;
        let mut rounds = 0u32;

        loop {
            let max_tokens = if rounds == 0 {
                self.settings.first_max_tokens
            } else {
                self.settings.followup_max_tokens
            };
            let request = ProviderRequest {
                messages: conversation.messages().to_vec(),
                settings: GenerationSettings::builder()
                    .max_tokens(max_tokens)
                    .temperature(0.0)
                    .tool_choice(ToolChoice::Auto)
                    .build(),
                tools: tools.clone(),
            };

            debug!(
                provider = self.provider.provider_name(),
                messages = request.messages.len(),
                max_tokens,
                "calling model"
            );
            let response = self.provider.generate_text(&request).await?;
            usage.merge(&response.usage);

            if response.is_content_filtered() {
                filtered += 1;
                if filtered > self.settings.content_filter_retries {
                    return Err(DocentError::ContentPolicyExhausted { attempts: filtered });
                }
                warn!(
                    attempt = filtered,
                    max = self.settings.content_filter_retries,
                    "content filter triggered, retrying"
                );
                continue;
            }

            if response.tool_calls.is_empty() {
                debug!(
                    rounds,
                    input_tokens = usage.input_tokens,
                    output_tokens = usage.output_tokens,
                    "turn complete"
                );
                return Ok(TurnReply {
                    text: response.text,
                    images,
                    usage,
                });
            }

            rounds += 1;
            if rounds > self.settings.max_tool_rounds {
                return Err(DocentError::InvalidState(format!(
                    "exceeded {} tool rounds",
                    self.settings.max_tool_rounds
                )));
            }

            conversation.push(ModelMessage::assistant_tool_calls(
                response.text,
                &response.tool_calls,
            ));

            let rejected = response
                .tool_calls
                .iter()
                .find_map(|call| self.tools.check(&call.name, &call.arguments).err());
            if let Some(reason) = rejected {
                warn!(error = %reason, round = rounds, "tool round rejected");
                conversation.rollback_last();
                if self.settings.grounded_only {
                    conversation.push(ModelMessage::system(GROUNDING_INSTRUCTION));
                }
                continue;
            }

            for call in &response.tool_calls {
                let ctx = ToolExecutionContext {
                    tool_call_id: call.id.clone(),
                    language: language.to_string(),
                };
                debug!(tool = %call.name, call_id = %call.id, "executing tool");
                let output = self
                    .tools
                    .invoke(&call.name, call.arguments.clone(), &ctx)
                    .await?;
                if let Some(found) = output.images() {
                    images = found;
                }
                conversation.push(ModelMessage::tool_result(
                    call.id.clone(),
                    call.name.clone(),
                    output.content,
                ));
            }

            if self.settings.grounded_only {
                conversation.push(ModelMessage::system(GROUNDING_INSTRUCTION));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loop_defaults() {
        let settings = LoopSettings::default();
        assert_eq!(settings.first_max_tokens, 600);
        assert_eq!(settings.followup_max_tokens, 300);
        assert_eq!(settings.content_filter_retries, 3);
        assert_eq!(settings.max_tool_rounds, 10);
        assert!(!settings.grounded_only);
    }

    #[test]
    fn grounded_only_for_local_without_internet() {
        let local_only = SearchSettings {
            internet_search: 0,
            ..SearchSettings::default()
        };
        assert!(LoopSettings::for_search(&local_only).grounded_only);
        assert!(!LoopSettings::for_search(&SearchSettings::default()).grounded_only);
    }
}
