//! Generation settings and related enums.

use bon::Builder;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Settings controlling a single completion request.
#[derive(Debug, Clone, Builder, Serialize, Deserialize, Default, PartialEq)]
pub struct GenerationSettings {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f64>,
    pub tool_choice: Option<ToolChoice>,
}

/// How the model may choose tools.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ToolChoice {
    Auto,
    None,
    Required,
}

/// Why generation finished.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
    ToolCalls,
    ContentFilter,
    Error,
}

impl FinishReason {
    /// Parse a provider finish reason; unknown values map to `None`.
    pub fn parse(s: &str) -> Option<Self> {
        s.parse().ok()
    }
}

/// Token accounting reported by a provider.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn merge(&mut self, other: &Usage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.total_tokens += other.total_tokens;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_reason_parses_provider_strings() {
        assert_eq!(FinishReason::parse("content_filter"), Some(FinishReason::ContentFilter));
        assert_eq!(FinishReason::parse("tool_calls"), Some(FinishReason::ToolCalls));
        assert_eq!(FinishReason::parse("function_call"), None);
    }

    #[test]
    fn builder_sets_fields() {
        let settings = GenerationSettings::builder()
            .max_tokens(600)
            .temperature(0.0)
            .tool_choice(ToolChoice::Auto)
            .build();
        assert_eq!(settings.max_tokens, Some(600));
        assert_eq!(settings.tool_choice, Some(ToolChoice::Auto));
    }

    #[test]
    fn usage_merge_accumulates() {
        let mut total = Usage::default();
        total.merge(&Usage { input_tokens: 1, output_tokens: 2, total_tokens: 3 });
        total.merge(&Usage { input_tokens: 1, output_tokens: 2, total_tokens: 3 });
        assert_eq!(total.total_tokens, 6);
    }
}
