//! Persisted store state.
//!
//! The whole [`StoreState`] is written under one namespaced key after every
//! applied mutation and read back on startup. Where it is written is decided
//! by a [`StateStorage`] back end: SQLite, one JSON file per key, or memory.
//! [`StatePersister`] ties a back end to a key and plugs into the store as a
//! [`StateObserver`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::database::Database;
use crate::managers::bookmark_store::{StateObserver, StoreState};
use crate::types::errors::StorageError;

/// Envelope version written alongside the state.
pub const STATE_VERSION: u32 = 0;

/// Durable key/value storage for serialized state.
pub trait StateStorage: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn save(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Shape written to storage: `{ "state": {...}, "version": 0 }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedEnvelope {
    pub state: StoreState,
    #[serde(default)]
    pub version: u32,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    state: &'a StoreState,
    version: u32,
}

// === SQLite ===

/// Stores state in the `persisted_state` table.
pub struct SqliteStateStorage {
    db: Mutex<Database>,
}

impl SqliteStateStorage {
    pub fn new(db: Database) -> Self {
        Self { db: Mutex::new(db) }
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        Ok(Self::new(Database::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Ok(Self::new(Database::open_in_memory()?))
    }
}

impl StateStorage for SqliteStateStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        let value = db
            .connection()
            .query_row(
                "SELECT value FROM persisted_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        db.connection().execute(
            "INSERT OR REPLACE INTO persisted_state (key, value, updated_at) VALUES (?1, ?2, ?3)",
            params![key, value, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::Database(e.to_string()))?;
        db.connection()
            .execute("DELETE FROM persisted_state WHERE key = ?1", params![key])?;
        Ok(())
    }
}

// === JSON files ===

/// Stores each key as `<dir>/<key>.json`.
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the file backing `key`. Characters outside `[A-Za-z0-9_-]`
    /// are replaced so a key can never escape the directory.
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", file))
    }
}

impl StateStorage for JsonFileStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(&path)
            .map(Some)
            .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| StorageError::Io(format!("Failed to create state directory: {}", e)))?;
        let path = self.path_for(key);
        fs::write(&path, value)
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path)
                .map_err(|e| StorageError::Io(format!("Failed to remove {}: {}", path.display(), e)))?;
        }
        Ok(())
    }
}

// === Memory ===

/// Volatile storage, mostly for tests. Counts writes.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    writes: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `save` calls so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl StateStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(entries.get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        entries.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| StorageError::Io(e.to_string()))?;
        entries.remove(key);
        Ok(())
    }
}

// === Persister ===

/// Binds a storage back end to the key the store state lives under.
#[derive(Clone)]
pub struct StatePersister {
    storage: Arc<dyn StateStorage>,
    key: String,
}

impl StatePersister {
    pub fn new(storage: Arc<dyn StateStorage>, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Reads and decodes the stored envelope, if any.
    pub fn load(&self) -> Result<Option<StoreState>, StorageError> {
        let Some(raw) = self.storage.load(&self.key)? else {
            return Ok(None);
        };
        let envelope: PersistedEnvelope = serde_json::from_str(&raw)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        if envelope.version != STATE_VERSION {
            debug!(version = envelope.version, "Loading state written by another version");
        }
        Ok(Some(envelope.state))
    }

    /// Encodes and writes `state`.
    pub fn save(&self, state: &StoreState) -> Result<(), StorageError> {
        let envelope = EnvelopeRef {
            state,
            version: STATE_VERSION,
        };
        let json = serde_json::to_string(&envelope)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage.save(&self.key, &json)
    }

    /// Drops the stored state.
    pub fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(&self.key)
    }
}

impl StateObserver for StatePersister {
    fn state_changed(&mut self, state: &StoreState) {
        if let Err(e) = self.save(state) {
            warn!(key = %self.key, error = %e, "Failed to persist store state");
        }
    }
}
