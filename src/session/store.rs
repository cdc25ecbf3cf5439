//! Concurrent registry of live sessions with eviction and persistence sweeps.

use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::model::{Session, SessionKey, SessionStatus};
use super::persist::{session_record_key, SessionPersister};
use crate::config::SessionSettings;
use crate::error::DocentError;
use crate::types::HistoryEntry;

/// Outcome of one persistence sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistReport {
    pub sessions: usize,
    pub turns_written: usize,
    pub failures: usize,
    /// Turns dropped from memory after being persisted.
    pub truncated: usize,
}

/// Owns every session: an active registry keyed by (access token, client id)
/// and a pending registry of evicted sessions awaiting persistence.
///
/// Both registries are sharded maps; each read or mutation of a session holds
/// only that entry's shard lock and never across an await point.
pub struct SessionStore {
    active: DashMap<SessionKey, Session>,
    /// Keyed by the durable record key, so a re-created session never
    /// collides with its evicted predecessor.
    pending: DashMap<(String, String), Session>,
    persister: SessionPersister,
    settings: SessionSettings,
}

impl SessionStore {
    pub fn new(persister: SessionPersister, settings: SessionSettings) -> Self {
        Self {
            active: DashMap::new(),
            pending: DashMap::new(),
            persister,
            settings,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn persister(&self) -> &SessionPersister {
        &self.persister
    }

    /// Turns retained in memory and replayed per prompt.
    fn keep(&self) -> usize {
        self.settings.history_length + 1
    }

    /// Start a fresh active session under `access_token` and return its client id.
    pub fn create_session(&self, access_token: &str) -> String {
        loop {
            let client_id = Uuid::new_v4().to_string();
            let key = SessionKey::new(access_token, &client_id);
            if let Entry::Vacant(slot) = self.active.entry(key) {
                let session = Session::new(slot.key(), Utc::now());
                slot.insert(session);
                info!(access_token, client_id = %client_id, "session created");
                return client_id;
            }
        }
    }

    /// Mark a session inactive. Repeated calls are no-ops.
    pub fn close_session(&self, access_token: &str, client_id: &str) -> Result<String, DocentError> {
        let key = SessionKey::new(access_token, client_id);
        match self.active.get_mut(&key) {
            Some(mut session) => {
                session.status = SessionStatus::Inactive;
                info!(access_token, client_id, "session closed");
                Ok(client_id.to_string())
            }
            None => Err(DocentError::not_found(access_token, client_id)),
        }
    }

    /// Recent history as alternating user/assistant entries, creating the
    /// session if it does not exist.
    pub fn recent_turns(&self, access_token: &str, client_id: &str) -> Result<Vec<HistoryEntry>, DocentError> {
        let session = self.get_or_create(access_token, client_id);
        if !session.is_active() {
            return Err(DocentError::inactive(access_token, client_id));
        }
        Ok(session.recent(self.keep()))
    }

    /// Record a completed exchange, creating the session if it does not exist.
    pub fn append_turn(
        &self,
        access_token: &str,
        client_id: &str,
        language: &str,
        system_prompt: &str,
        user_text: &str,
        assistant_text: &str,
    ) {
        let mut session = self.get_or_create(access_token, client_id);
        session.append(language, system_prompt, user_text, assistant_text, Utc::now());
        debug!(access_token, client_id, turns = session.turns.len(), "turn appended");
    }

    fn get_or_create(
        &self,
        access_token: &str,
        client_id: &str,
    ) -> dashmap::mapref::one::RefMut<'_, SessionKey, Session> {
        let key = SessionKey::new(access_token, client_id);
        self.active.entry(key.clone()).or_insert_with(|| {
            debug!(access_token, client_id, "session auto-provisioned");
            Session::new(&key, Utc::now())
        })
    }

    /// Copy of an active session.
    pub fn snapshot(&self, access_token: &str, client_id: &str) -> Option<Session> {
        self.active
            .get(&SessionKey::new(access_token, client_id))
            .map(|s| s.clone())
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Move idle sessions to the pending registry. Returns how many moved.
    pub fn evict_idle(&self) -> usize {
        self.evict_idle_at(Utc::now(), self.settings.activity_timeout())
    }

    /// Evict sessions idle for longer than `timeout` as of `now`.
    pub fn evict_idle_at(&self, now: DateTime<Utc>, timeout: Duration) -> usize {
        let keys: Vec<SessionKey> = self.active.iter().map(|e| e.key().clone()).collect();
        let mut evicted = 0;
        for key in keys {
            // The predicate runs under the entry lock, so an append racing
            // with the sweep either lands before removal or re-provisions.
            if let Some((_, mut session)) = self.active.remove_if(&key, |_, s| s.is_idle(now, timeout)) {
                session.status = SessionStatus::Inactive;
                self.pending.insert(session_record_key(&session), session);
                evicted += 1;
            }
        }
        if evicted > 0 {
            info!(evicted, active = self.active.len(), "eviction sweep");
        }
        evicted
    }

    /// Flush pending sessions to durable storage and drop them, then flush
    /// active sessions in place and trim their persisted history.
    pub async fn persist(&self) -> PersistReport {
        let mut report = PersistReport::default();

        let pending_keys: Vec<(String, String)> =
            self.pending.iter().map(|e| e.key().clone()).collect();
        for key in pending_keys {
            let Some((key, session)) = self.pending.remove(&key) else {
                continue;
            };
            report.sessions += 1;
            match self.persister.persist(&session).await {
                Ok(written) => report.turns_written += written,
                Err(e) => {
                    warn!(
                        access_token = %session.access_token,
                        client_id = %session.client_id,
                        error = %e,
                        "persisting evicted session failed, will retry"
                    );
                    report.failures += 1;
                    self.pending.insert(key, session);
                }
            }
        }

        let active_keys: Vec<SessionKey> = self.active.iter().map(|e| e.key().clone()).collect();
        for key in active_keys {
            let Some(session) = self.active.get(&key).map(|s| s.clone()) else {
                continue;
            };
            report.sessions += 1;
            match self.persister.persist(&session).await {
                Ok(written) => {
                    report.turns_written += written;
                    if let Some(mut live) = self.active.get_mut(&key) {
                        if live.created_at == session.created_at {
                            report.truncated += live.truncate_persisted(session.turns.len(), self.keep());
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        access_token = %key.access_token,
                        client_id = %key.client_id,
                        error = %e,
                        "persisting active session failed"
                    );
                    report.failures += 1;
                }
            }
        }

        info!(
            sessions = report.sessions,
            turns_written = report.turns_written,
            failures = report.failures,
            "persistence sweep"
        );
        report
    }
}
