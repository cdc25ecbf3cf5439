//! Language resolution and localized fallback text.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const DEFAULT_LANGUAGE: &str = "vi-VN";
const DEFAULT_FALLBACK: &str =
    "Xin lỗi, tôi không thể trả lời câu hỏi này. Vui lòng hỏi câu hỏi khác!";

/// Per-language entry of the localization table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageEntry {
    /// Display name used in the system prompt (e.g. "Vietnamese").
    pub name: String,
    /// Apology shown when a turn cannot be answered.
    #[serde(default)]
    pub fallback: Option<String>,
}

/// Maps language codes to display names and fallback messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Localization {
    pub default_language: String,
    pub default_fallback: String,
    /// Locale codes accepted from clients; empty accepts every configured language.
    pub supported_locales: Vec<String>,
    pub languages: BTreeMap<String, LanguageEntry>,
}

impl Default for Localization {
    fn default() -> Self {
        let mut languages = BTreeMap::new();
        languages.insert(
            "vi-VN".to_string(),
            LanguageEntry {
                name: "Vietnamese".to_string(),
                fallback: Some(DEFAULT_FALLBACK.to_string()),
            },
        );
        languages.insert(
            "en-US".to_string(),
            LanguageEntry {
                name: "English".to_string(),
                fallback: Some(
                    "Sorry, I can't answer this question. Please ask another one!".to_string(),
                ),
            },
        );
        Self {
            default_language: DEFAULT_LANGUAGE.to_string(),
            default_fallback: DEFAULT_FALLBACK.to_string(),
            supported_locales: Vec::new(),
            languages,
        }
    }
}

impl Localization {
    pub fn set_supported_locales(&mut self, locales: impl IntoIterator<Item = String>) {
        self.supported_locales = locales.into_iter().filter(|l| !l.is_empty()).collect();
    }

    /// Resolve a client language code to a supported one, falling back to the default.
    pub fn resolve<'a>(&'a self, code: &'a str) -> &'a str {
        let supported = if self.supported_locales.is_empty() {
            self.languages.contains_key(code)
        } else {
            self.supported_locales.iter().any(|l| l == code)
        };
        if supported {
            code
        } else {
            &self.default_language
        }
    }

    /// Display name of the language used in prompts.
    pub fn language_name(&self, code: &str) -> String {
        let resolved = self.resolve(code);
        self.languages
            .get(resolved)
            .or_else(|| self.languages.get(&self.default_language))
            .map(|entry| entry.name.clone())
            .unwrap_or_else(|| resolved.to_string())
    }

    /// Localized apology for a failed turn; unknown codes get the generic default.
    pub fn fallback(&self, code: &str) -> &str {
        self.languages
            .get(code)
            .and_then(|entry| entry.fallback.as_deref())
            .unwrap_or(&self.default_fallback)
    }
}
