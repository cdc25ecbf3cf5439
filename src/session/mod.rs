//! Session store: live sessions, idle eviction, and durable persistence.

pub mod model;
pub mod persist;
pub mod store;
pub mod sweeper;

pub use model::{format_timestamp, Session, SessionKey, SessionStatus, Turn};
pub use persist::{
    FileRecordStore, MemoryRecordStore, RecordStore, SessionPersister, TableRecord,
};
pub use store::{PersistReport, SessionStore};
pub use sweeper::Sweeper;
