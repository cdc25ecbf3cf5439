//! System prompt rendering.

use chrono::{DateTime, Utc};

use crate::config::SearchSettings;
use crate::localization::Localization;
use crate::search::{format_current_date, search_mode_prompt};

/// Renders the persona template for a turn.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    persona: String,
    localization: Localization,
    search_mode: &'static str,
}

impl PromptBuilder {
    pub fn new(persona: impl Into<String>, localization: Localization, search: &SearchSettings) -> Self {
        Self {
            persona: persona.into(),
            localization,
            search_mode: search_mode_prompt(search.local_enabled(), search.internet_enabled()),
        }
    }

    pub fn system_prompt(&self, language: &str) -> String {
        self.system_prompt_at(language, Utc::now())
    }

    pub fn system_prompt_at(&self, language: &str, now: DateTime<Utc>) -> String {
        self.persona
            .replace("{current_date}", &format_current_date(now))
            .replace("{prompt_by_search_mode}", self.search_mode)
            .replace("{language}", &self.localization.language_name(language))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn placeholders_are_filled() {
        let settings = SearchSettings {
            internet_search: 0,
            ..SearchSettings::default()
        };
        let builder = PromptBuilder::new(
            "Today is {current_date}. {prompt_by_search_mode} Reply in {language}.",
            Localization::default(),
            &settings,
        );
        let now = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        let prompt = builder.system_prompt_at("en-US", now);
        assert!(prompt.starts_with("Today is Tuesday, March 05, 2024. Please give that answer based on the Local"));
        assert!(prompt.ends_with("Reply in English."));
        assert!(builder.system_prompt_at("xx", now).ends_with("Reply in Vietnamese."));
    }
}
