//! Key-value persistence layer
//!
//! The session record, the live cargo list, its photos and the shipment history are
//! stored as JSON strings under fixed keys. Backends only need to move
//! strings around; they know nothing about the values.

mod memory;
mod sqlite;

use thiserror::Error;

pub(crate) use memory::MemoryStore;
pub(crate) use sqlite::SqliteStore;

/// Key holding the active employee session
pub(crate) const SESSION_KEY: &str = "employeeAuth";
/// Key holding the live cargo list
pub(crate) const CARGO_LIST_KEY: &str = "cargoList";
/// Key holding photo bytes of the live list, one entry per batch
pub(crate) const PHOTOS_KEY: &str = "cargoPhotos";
/// Key holding sent shipment snapshots
pub(crate) const HISTORY_KEY: &str = "shipmentHistory";

#[derive(Debug, Error)]
pub(crate) enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage quota exceeded writing \"{key}\" ({needed} of {limit} bytes)")]
    QuotaExceeded {
        key: String,
        needed: usize,
        limit: usize,
    },

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// A single write in an atomic batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum KvOp {
    Set { key: String, value: String },
    Remove { key: String },
}

impl KvOp {
    pub(crate) fn set(key: &str, value: String) -> Self {
        KvOp::Set {
            key: key.to_string(),
            value,
        }
    }

    pub(crate) fn remove(key: &str) -> Self {
        KvOp::Remove {
            key: key.to_string(),
        }
    }
}

/// String key-value store.
///
/// Missing keys read as `None`. `apply` must be all-or-nothing: either
/// every op in the batch lands or the store is left untouched.
pub(crate) trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.apply(&[KvOp::set(key, value.to_string())])
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.apply(&[KvOp::remove(key)])
    }

    fn apply(&self, ops: &[KvOp]) -> Result<(), StorageError>;
}
