//! Slot persistence
//!
//! State is mirrored into three independent string slots (runs, goals,
//! profile), each holding a self-contained JSON document. Slots are written
//! in full after every mutation and read back independently on startup, so
//! one unreadable slot never prevents the others from loading.

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error, warn};

use crate::error::{MarathonLogError, Result, StorageError};
use crate::models::{Goal, Run, UserProfile};
use crate::store::AppState;

/// Slot holding the run collection
pub const RUNS_KEY: &str = "marathon-runs";
/// Slot holding the goal collection
pub const GOALS_KEY: &str = "marathon-goals";
/// Slot holding the user profile
pub const PROFILE_KEY: &str = "marathon-profile";

/// String-keyed slot storage
pub trait SlotStore {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> std::result::Result<(), StorageError>;
}

/// In-process slot store with an optional byte quota
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
    quota_bytes: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects writes once the total payload would exceed `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            slots: HashMap::new(),
            quota_bytes: Some(bytes),
        }
    }

    fn used_bytes_excluding(&self, key: &str) -> usize {
        self.slots
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(_, v)| v.len())
            .sum()
    }
}

impl SlotStore for MemoryStore {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, StorageError> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), StorageError> {
        if let Some(quota) = self.quota_bytes {
            let available = quota.saturating_sub(self.used_bytes_excluding(key));
            if value.len() > available {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed: value.len(),
                    available,
                });
            }
        }
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> std::result::Result<(), StorageError> {
        self.slots.remove(key);
        Ok(())
    }
}

/// SQLite-backed slot store, one row per slot
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create or open a slot database at the specified path
    pub fn open<P: AsRef<Path>>(db_path: P) -> std::result::Result<Self, StorageError> {
        let conn = Connection::open(db_path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    pub fn open_in_memory() -> std::result::Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> std::result::Result<(), StorageError> {
        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS slots (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(())
    }
}

impl SlotStore for SqliteStore {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM slots WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), StorageError> {
        self.conn.execute(
            r#"
            INSERT INTO slots (key, value, updated_at) VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> std::result::Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM slots WHERE key = ?1", params![key])?;
        Ok(())
    }
}

/// Slots read back at startup. `None` means absent or unreadable.
#[derive(Debug, Default)]
pub struct LoadedState {
    pub runs: Option<Vec<Run>>,
    pub goals: Option<Vec<Goal>>,
    pub profile: Option<UserProfile>,
}

/// Mirrors application state into a slot store
pub struct Persistence<S: SlotStore> {
    store: S,
}

impl<S: SlotStore> Persistence<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Write every slot. Failures are logged and swallowed; returns the
    /// number of slots written.
    pub fn save(&mut self, state: &AppState) -> usize {
        let mut written = 0;

        for result in [
            self.write_slot(RUNS_KEY, &state.runs),
            self.write_slot(GOALS_KEY, &state.goals),
        ] {
            match result {
                Ok(()) => written += 1,
                Err(e) => error!(error = %e, "Error saving to local storage"),
            }
        }

        if let Some(profile) = &state.user_profile {
            match self.write_slot(PROFILE_KEY, profile) {
                Ok(()) => written += 1,
                Err(e) => error!(error = %e, "Error saving to local storage"),
            }
        }

        debug!(slots = written, "State persisted");
        written
    }

    /// Read every slot independently
    pub fn load(&self) -> LoadedState {
        LoadedState {
            runs: self.read_slot(RUNS_KEY),
            goals: self.read_slot(GOALS_KEY),
            profile: self.read_slot(PROFILE_KEY),
        }
    }

    fn write_slot<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        let payload = serde_json::to_string(value)?;
        self.store.set(key, &payload)?;
        Ok(())
    }

    fn read_slot<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.try_read_slot(key) {
            Ok(value) => value,
            Err(e) => {
                error!(slot = key, error = %e, "Error loading slot from local storage");
                None
            }
        }
    }

    fn try_read_slot<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(payload) = self.store.get(key)? else {
            debug!(slot = key, "Slot empty");
            return Ok(None);
        };

        serde_json::from_str(&payload).map(Some).map_err(|e| {
            warn!(slot = key, bytes = payload.len(), "Slot payload is malformed");
            MarathonLogError::Storage(StorageError::CorruptSlot {
                key: key.to_string(),
                reason: e.to_string(),
            })
        })
    }
}
