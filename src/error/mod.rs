//! Error types for Docent.

use thiserror::Error;

/// Primary error type for all Docent operations.
#[derive(Error, Debug)]
pub enum DocentError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Rate limited: retry after {retry_after_ms:?}ms")]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("access_token={access_token} - client_id={client_id} not found!")]
    NotFound {
        access_token: String,
        client_id: String,
    },

    #[error("access_token={access_token} - client_id={client_id} not active!")]
    Inactive {
        access_token: String,
        client_id: String,
    },

    #[error("Content was filtered due to content policy after {attempts} attempts")]
    ContentPolicyExhausted { attempts: u32 },

    #[error("Tool call rejected: {tool_name}: {reason}")]
    ToolRejected { tool_name: String, reason: String },

    #[error("Tool execution error: {tool_name}: {message}")]
    ToolExecution { tool_name: String, message: String },

    #[error("{branch} generated an exception: {message}")]
    Search { branch: String, message: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),
}

impl DocentError {
    /// Create an API error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(access_token: &str, client_id: &str) -> Self {
        Self::NotFound {
            access_token: access_token.to_string(),
            client_id: client_id.to_string(),
        }
    }

    pub fn inactive(access_token: &str, client_id: &str) -> Self {
        Self::Inactive {
            access_token: access_token.to_string(),
            client_id: client_id.to_string(),
        }
    }

    /// Whether this error is potentially retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Network(_) | Self::Timeout(_) => true,
            Self::Api { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, DocentError>;
