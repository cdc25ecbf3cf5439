//! Durable storage of sessions and turns as flat partition/row records.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::debug;

use super::model::{format_timestamp, Session, Turn};
use crate::error::DocentError;

/// A flat record addressed by a two-part key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    pub partition_key: String,
    pub row_key: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, String>,
}

impl TableRecord {
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }
}

/// Table storage with get/create/update by key.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<TableRecord>, DocentError>;

    /// Create a record; fails if the key already exists.
    async fn create(&self, table: &str, record: TableRecord) -> Result<(), DocentError>;

    /// Replace an existing record; fails if the key is absent.
    async fn update(&self, table: &str, record: TableRecord) -> Result<(), DocentError>;
}

/// Create the record, or update it when the key exists.
pub async fn upsert(store: &dyn RecordStore, table: &str, record: TableRecord) -> Result<(), DocentError> {
    match store.get(table, &record.partition_key, &record.row_key).await? {
        Some(_) => store.update(table, record).await,
        None => store.create(table, record).await,
    }
}

/// Create the record unless the key exists. Returns whether it was written.
pub async fn insert_if_absent(
    store: &dyn RecordStore,
    table: &str,
    record: TableRecord,
) -> Result<bool, DocentError> {
    if store.get(table, &record.partition_key, &record.row_key).await?.is_some() {
        return Ok(false);
    }
    store.create(table, record).await?;
    Ok(true)
}

/// Partition/row key of a session's durable record.
pub fn session_record_key(session: &Session) -> (String, String) {
    (
        session.access_token.clone(),
        format!("{}_{}", session.client_id, format_timestamp(session.created_at)),
    )
}

pub fn session_record(session: &Session) -> TableRecord {
    let (partition, row) = session_record_key(session);
    let first = session.turns.first();
    let language = if session.language.is_empty() {
        first.map(|t| t.language.clone()).unwrap_or_default()
    } else {
        session.language.clone()
    };
    let init_prompt = if session.init_prompt.is_empty() {
        first.map(|t| t.system_prompt.clone()).unwrap_or_default()
    } else {
        session.init_prompt.clone()
    };
    TableRecord::new(partition, row)
        .with("access_token", &session.access_token)
        .with("client_id", &session.client_id)
        .with("status", session.status.to_string())
        .with("created_at", format_timestamp(session.created_at))
        .with("updated_at", format_timestamp(session.updated_at))
        .with("language", language)
        .with("init_prompt", init_prompt)
}

/// Partition shared by all turns of a session.
pub fn turn_partition(session: &Session) -> String {
    format!(
        "{}_{}_{}",
        session.access_token,
        format_timestamp(session.created_at),
        session.client_id
    )
}

pub fn turn_record(session: &Session, turn: &Turn) -> TableRecord {
    TableRecord::new(turn_partition(session), format_timestamp(turn.created_at))
        .with("client_id", &session.client_id)
        .with("created_at", format_timestamp(turn.created_at))
        .with("language", &turn.language)
        .with("system", &turn.system_prompt)
        .with("user", &turn.user_text)
        .with("assistant", &turn.assistant_text)
}

/// Writes sessions into a session table and their turns into a turn table.
#[derive(Clone)]
pub struct SessionPersister {
    store: Arc<dyn RecordStore>,
    session_table: String,
    turn_table: String,
}

impl SessionPersister {
    pub fn new(
        store: Arc<dyn RecordStore>,
        session_table: impl Into<String>,
        turn_table: impl Into<String>,
    ) -> Self {
        Self {
            store,
            session_table: session_table.into(),
            turn_table: turn_table.into(),
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn session_table(&self) -> &str {
        &self.session_table
    }

    pub fn turn_table(&self) -> &str {
        &self.turn_table
    }

    /// Upsert the session record and insert any turns not yet stored.
    /// Returns the number of turns written.
    pub async fn persist(&self, session: &Session) -> Result<usize, DocentError> {
        upsert(self.store.as_ref(), &self.session_table, session_record(session)).await?;
        let mut written = 0;
        for turn in &session.turns {
            if insert_if_absent(self.store.as_ref(), &self.turn_table, turn_record(session, turn)).await? {
                written += 1;
            }
        }
        debug!(
            access_token = %session.access_token,
            client_id = %session.client_id,
            turns = session.turns.len(),
            written,
            "persisted session"
        );
        Ok(written)
    }
}

type Table = BTreeMap<(String, String), TableRecord>;

fn already_exists(table: &str, record: &TableRecord) -> DocentError {
    DocentError::Storage(format!(
        "{table}: record {}/{} already exists",
        record.partition_key, record.row_key
    ))
}

fn missing(table: &str, record: &TableRecord) -> DocentError {
    DocentError::Storage(format!(
        "{table}: record {}/{} does not exist",
        record.partition_key, record.row_key
    ))
}

/// In-process record store.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    tables: Mutex<HashMap<String, Table>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records in a table.
    pub async fn count(&self, table: &str) -> usize {
        self.tables.lock().await.get(table).map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<TableRecord>, DocentError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .get(table)
            .and_then(|t| t.get(&(partition_key.to_string(), row_key.to_string())))
            .cloned())
    }

    async fn create(&self, table: &str, record: TableRecord) -> Result<(), DocentError> {
        let mut tables = self.tables.lock().await;
        let rows = tables.entry(table.to_string()).or_default();
        let key = (record.partition_key.clone(), record.row_key.clone());
        if rows.contains_key(&key) {
            return Err(already_exists(table, &record));
        }
        rows.insert(key, record);
        Ok(())
    }

    async fn update(&self, table: &str, record: TableRecord) -> Result<(), DocentError> {
        let mut tables = self.tables.lock().await;
        let key = (record.partition_key.clone(), record.row_key.clone());
        match tables.get_mut(table).and_then(|rows| rows.get_mut(&key)) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(missing(table, &record)),
        }
    }
}

/// Record store keeping one JSON document per table under a directory.
#[derive(Debug)]
pub struct FileRecordStore {
    base_dir: PathBuf,
    lock: Mutex<()>,
}

impl FileRecordStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            lock: Mutex::new(()),
        }
    }

    fn table_path(&self, table: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", normalize_label(table)))
    }

    async fn load(&self, path: &Path) -> Result<Table, DocentError> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Table::new()),
            Err(err) => return Err(err.into()),
        };
        let records: Vec<TableRecord> = serde_json::from_str(&raw)?;
        Ok(records
            .into_iter()
            .map(|r| ((r.partition_key.clone(), r.row_key.clone()), r))
            .collect())
    }

    async fn save(&self, path: &Path, table: &Table) -> Result<(), DocentError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let records: Vec<&TableRecord> = table.values().collect();
        let serialized = serde_json::to_string_pretty(&records)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serialized).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn get(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<TableRecord>, DocentError> {
        let _guard = self.lock.lock().await;
        let rows = self.load(&self.table_path(table)).await?;
        Ok(rows
            .get(&(partition_key.to_string(), row_key.to_string()))
            .cloned())
    }

    async fn create(&self, table: &str, record: TableRecord) -> Result<(), DocentError> {
        let _guard = self.lock.lock().await;
        let path = self.table_path(table);
        let mut rows = self.load(&path).await?;
        let key = (record.partition_key.clone(), record.row_key.clone());
        if rows.contains_key(&key) {
            return Err(already_exists(table, &record));
        }
        rows.insert(key, record);
        self.save(&path, &rows).await
    }

    async fn update(&self, table: &str, record: TableRecord) -> Result<(), DocentError> {
        let _guard = self.lock.lock().await;
        let path = self.table_path(table);
        let mut rows = self.load(&path).await?;
        let key = (record.partition_key.clone(), record.row_key.clone());
        if !rows.contains_key(&key) {
            return Err(missing(table, &record));
        }
        rows.insert(key, record);
        self.save(&path, &rows).await
    }
}

fn normalize_label(value: &str) -> String {
    let cleaned: String = value
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
                ch
            } else {
                '-'
            }
        })
        .collect();
    if cleaned.trim_matches('-').is_empty() {
        "default".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::model::SessionKey;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn session_with_turns(n: usize) -> Session {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut session = Session::new(&SessionKey::new("tok", "c1"), start);
        for i in 0..n {
            session.append(
                "vi-VN",
                "sys",
                &format!("q{i}"),
                &format!("a{i}"),
                start + chrono::TimeDelta::seconds(i as i64 + 1),
            );
        }
        session
    }

    #[test]
    fn record_keys_follow_layout() {
        let session = session_with_turns(1);
        let record = session_record(&session);
        assert_eq!(record.partition_key, "tok");
        assert_eq!(record.row_key, "c1_2024-05-01 08:00:00.000");
        assert_eq!(record.field("status"), Some("ACTIVE"));
        assert_eq!(record.field("init_prompt"), Some("sys"));

        let turn = turn_record(&session, &session.turns[0]);
        assert_eq!(turn.partition_key, "tok_2024-05-01 08:00:00.000_c1");
        assert_eq!(turn.row_key, "2024-05-01 08:00:01.000");
        assert_eq!(turn.field("user"), Some("q0"));
    }

    #[test]
    fn empty_language_falls_back_to_first_turn() {
        let mut session = session_with_turns(1);
        session.language.clear();
        assert_eq!(session_record(&session).field("language"), Some("vi-VN"));
    }

    #[tokio::test]
    async fn upsert_then_update() {
        let store = MemoryRecordStore::new();
        let record = TableRecord::new("p", "r").with("v", "1");
        upsert(&store, "t", record.clone()).await.unwrap();
        upsert(&store, "t", record.with("v", "2")).await.unwrap();
        let stored = store.get("t", "p", "r").await.unwrap().unwrap();
        assert_eq!(stored.field("v"), Some("2"));
        assert_eq!(store.count("t").await, 1);
    }

    #[tokio::test]
    async fn insert_if_absent_never_overwrites() {
        let store = MemoryRecordStore::new();
        let first = TableRecord::new("p", "r").with("v", "1");
        assert!(insert_if_absent(&store, "t", first).await.unwrap());
        let second = TableRecord::new("p", "r").with("v", "2");
        assert!(!insert_if_absent(&store, "t", second).await.unwrap());
        let stored = store.get("t", "p", "r").await.unwrap().unwrap();
        assert_eq!(stored.field("v"), Some("1"));
    }

    #[tokio::test]
    async fn persister_is_idempotent() {
        let store = Arc::new(MemoryRecordStore::new());
        let persister = SessionPersister::new(store.clone(), "clients", "conversations");
        let session = session_with_turns(3);
        assert_eq!(persister.persist(&session).await.unwrap(), 3);
        assert_eq!(persister.persist(&session).await.unwrap(), 0);
        assert_eq!(store.count("conversations").await, 3);
        assert_eq!(store.count("clients").await, 1);
    }

    #[tokio::test]
    async fn file_store_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileRecordStore::new(dir.path());
        let record = TableRecord::new("tok", "c1_x").with("status", "ACTIVE");
        store.create("clients", record.clone()).await.unwrap();
        assert!(store.create("clients", record.clone()).await.is_err());

        let reopened = FileRecordStore::new(dir.path());
        let loaded = reopened.get("clients", "tok", "c1_x").await.unwrap().unwrap();
        assert_eq!(loaded, record);
        assert!(reopened.get("clients", "tok", "other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn file_store_update_requires_existing() {
        let dir = TempDir::new().unwrap();
        let store = FileRecordStore::new(dir.path());
        let record = TableRecord::new("p", "r");
        assert!(store.update("t", record.clone()).await.is_err());
        store.create("t", record.clone()).await.unwrap();
        store.update("t", record.with("k", "v")).await.unwrap();
        assert_eq!(
            store.get("t", "p", "r").await.unwrap().unwrap().field("k"),
            Some("v")
        );
    }
}
