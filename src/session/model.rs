//! Session and turn state.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::types::{HistoryEntry, Role};

/// Timestamp rendering used in durable record keys.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(TIMESTAMP_FORMAT).to_string()
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Active,
    Inactive,
}

/// Identity of a live session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    pub access_token: String,
    pub client_id: String,
}

impl SessionKey {
    pub fn new(access_token: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            client_id: client_id.into(),
        }
    }
}

/// One user/assistant exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub language: String,
    pub system_prompt: String,
    pub user_text: String,
    pub assistant_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub client_id: String,
    pub status: SessionStatus,
    pub language: String,
    /// System prompt of the first turn; never overwritten once set.
    pub init_prompt: String,
    pub turns: Vec<Turn>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(key: &SessionKey, now: DateTime<Utc>) -> Self {
        Self {
            access_token: key.access_token.clone(),
            client_id: key.client_id.clone(),
            status: SessionStatus::Active,
            language: String::new(),
            init_prompt: String::new(),
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn key(&self) -> SessionKey {
        SessionKey::new(&self.access_token, &self.client_id)
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Append a turn stamped `now`, or 1 ms after the previous turn when the
    /// clock has not advanced, so turn timestamps stay strictly increasing.
    pub fn append(
        &mut self,
        language: &str,
        system_prompt: &str,
        user_text: &str,
        assistant_text: &str,
        now: DateTime<Utc>,
    ) {
        let created_at = match self.turns.last() {
            Some(last) if now <= last.created_at => last.created_at + TimeDelta::milliseconds(1),
            _ => now,
        };
        self.language = language.to_string();
        if self.init_prompt.is_empty() {
            self.init_prompt = system_prompt.to_string();
        }
        self.turns.push(Turn {
            language: language.to_string(),
            system_prompt: system_prompt.to_string(),
            user_text: user_text.to_string(),
            assistant_text: assistant_text.to_string(),
            created_at,
        });
        self.updated_at = created_at.max(self.updated_at);
    }

    /// The last `keep` turns as alternating user/assistant entries.
    pub fn recent(&self, keep: usize) -> Vec<HistoryEntry> {
        let start = self.turns.len().saturating_sub(keep);
        self.turns[start..]
            .iter()
            .flat_map(|turn| {
                [
                    HistoryEntry {
                        role: Role::User,
                        content: turn.user_text.clone(),
                    },
                    HistoryEntry {
                        role: Role::Assistant,
                        content: turn.assistant_text.clone(),
                    },
                ]
            })
            .collect()
    }

    /// Drop persisted turns from the front until at most `keep` remain.
    /// Only the first `persisted` turns are eligible.
    pub fn truncate_persisted(&mut self, persisted: usize, keep: usize) -> usize {
        let excess = self.turns.len().saturating_sub(keep);
        let drop = excess.min(persisted);
        self.turns.drain(..drop);
        drop
    }

    /// Whether `idle` exceeds `timeout` as of `now`.
    pub fn is_idle(&self, now: DateTime<Utc>, timeout: std::time::Duration) -> bool {
        (now - self.updated_at)
            .to_std()
            .map(|idle| idle > timeout)
            .unwrap_or(false)
    }
}
