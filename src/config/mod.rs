//! Configuration system (layered: TOML settings file < env < code).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DocentError, Result};
use crate::localization::Localization;

const DEFAULT_PERSONA: &str = "You are a helpful virtual assistant. Today is {current_date}. \
{prompt_by_search_mode} Always answer in {language}.";

/// Settings that shape the search fan-out and the tool loop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Result cap for the content-index branch; 0 disables it.
    pub local_search: u32,
    /// Result cap for the web branch; 0 disables it.
    pub internet_search: u32,
    /// Minimum reranker score for a local result to contribute images.
    pub relevance_threshold: f64,
    /// Words stripped from the query before the content-index lookup.
    pub query_stopwords: Vec<String>,
    pub semantic_configuration: String,
    /// Maximum image references returned to the client per turn.
    pub max_images: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            local_search: 3,
            internet_search: 3,
            relevance_threshold: 2.3,
            query_stopwords: Vec::new(),
            semantic_configuration: "my-semantic-config".to_string(),
            max_images: 3,
        }
    }
}

impl SearchSettings {
    pub fn local_enabled(&self) -> bool {
        self.local_search > 0
    }

    pub fn internet_enabled(&self) -> bool {
        self.internet_search > 0
    }
}

/// Session lifecycle settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Past exchanges replayed into each prompt (the store keeps `history_length + 1`).
    pub history_length: usize,
    /// Seconds of inactivity before a session is evicted; also the eviction interval.
    pub status_duration: u64,
    /// Seconds between persistence sweeps.
    pub outdate_duration: u64,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            history_length: 2,
            status_duration: 3600,
            outdate_duration: 3600,
        }
    }
}

impl SessionSettings {
    pub fn activity_timeout(&self) -> Duration {
        Duration::from_secs(self.status_duration)
    }

    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.outdate_duration)
    }
}

/// Durable storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSettings {
    pub data_dir: PathBuf,
    pub client_table: String,
    pub conversation_table: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            client_table: "clients".to_string(),
            conversation_table: "conversations".to_string(),
        }
    }
}

/// Remote service endpoints and credentials, read from the environment.
#[derive(Clone, Default)]
pub struct ServiceEndpoints {
    pub openai_endpoint: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_api_version: Option<String>,
    pub openai_deployment: Option<String>,
    pub embedding_deployment: Option<String>,
    pub search_endpoint: Option<String>,
    pub search_api_key: Option<String>,
    pub search_index: Option<String>,
    pub bing_api_key: Option<String>,
    pub bing_url: Option<String>,
}

impl std::fmt::Debug for ServiceEndpoints {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceEndpoints")
            .field("openai_endpoint", &self.openai_endpoint)
            .field("openai_api_key", &self.openai_api_key.as_ref().map(|_| ".."))
            .field("openai_api_version", &self.openai_api_version)
            .field("openai_deployment", &self.openai_deployment)
            .field("embedding_deployment", &self.embedding_deployment)
            .field("search_endpoint", &self.search_endpoint)
            .field("search_api_key", &self.search_api_key.as_ref().map(|_| ".."))
            .field("search_index", &self.search_index)
            .field("bing_api_key", &self.bing_api_key.as_ref().map(|_| ".."))
            .field("bing_url", &self.bing_url)
            .finish()
    }
}

/// Return a configured value or a configuration error naming the env var.
pub fn require<'a>(value: &'a Option<String>, env_var: &str) -> Result<&'a str> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DocentError::Configuration(format!("Missing {env_var}")))
}

/// Shape of the optional TOML settings file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    #[serde(flatten)]
    search: SearchSettings,
    #[serde(flatten)]
    sessions: SessionSettings,
    persona: Option<String>,
    #[serde(flatten)]
    localization: Localization,
}

/// Full application configuration.
#[derive(Debug, Clone)]
pub struct DocentConfig {
    pub endpoints: ServiceEndpoints,
    pub search: SearchSettings,
    pub sessions: SessionSettings,
    pub storage: StorageSettings,
    pub localization: Localization,
    /// System prompt template with `{current_date}`, `{prompt_by_search_mode}`
    /// and `{language}` placeholders.
    pub persona: String,
}

impl Default for DocentConfig {
    fn default() -> Self {
        Self {
            endpoints: ServiceEndpoints::default(),
            search: SearchSettings::default(),
            sessions: SessionSettings::default(),
            storage: StorageSettings::default(),
            localization: Localization::default(),
            persona: DEFAULT_PERSONA.to_string(),
        }
    }
}

impl DocentConfig {
    /// Load from environment variables, reading the settings file named by
    /// `DOCENT_CONFIG` when present.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error

        let mut config = match std::env::var("DOCENT_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => Self::default(),
        };

        let env = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());
        config.endpoints = ServiceEndpoints {
            openai_endpoint: env("AZURE_OPENAI_ENDPOINT"),
            openai_api_key: env("AZURE_OPENAI_API_KEY"),
            openai_api_version: env("AZURE_OPENAI_API_VERSION"),
            openai_deployment: env("AZURE_OPENAI_DEPLOYMENT_NAME"),
            embedding_deployment: env("AZURE_OPENAI_EMB_DEPLOYMENT"),
            search_endpoint: env("COGNITIVE_SEARCH_ENDPOINT"),
            search_api_key: env("COGNITIVE_SEARCH_API_KEY"),
            search_index: env("COGNITIVE_SEARCH_INDEX_NAME"),
            bing_api_key: env("BING_SUBSCRIPTION_KEY"),
            bing_url: env("BING_SEARCH_URL"),
        };

        if let Some(dir) = env("DOCENT_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(table) = env("DB_TABLE_CLIENT") {
            config.storage.client_table = table;
        }
        if let Some(table) = env("DB_TABLE_CONVERSATION") {
            config.storage.conversation_table = table;
        }
        if let Some(locales) = env("STT_LOCALES") {
            config.localization.set_supported_locales(
                locales.split(',').map(|l| l.trim().to_string()),
            );
        }

        Ok(config)
    }

    /// Load settings from a TOML file; endpoints are left empty.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml_str(&raw)
    }

    /// Parse settings from TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: SettingsFile = toml::from_str(raw)
            .map_err(|e| DocentError::Configuration(format!("Invalid settings file: {e}")))?;
        Ok(Self {
            search: file.search,
            sessions: file.sessions,
            localization: file.localization,
            persona: file.persona.unwrap_or_else(|| DEFAULT_PERSONA.to_string()),
            ..Self::default()
        })
    }
}

fn default_data_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".docent"))
        .unwrap_or_else(|| PathBuf::from(".docent"))
}
