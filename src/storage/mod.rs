use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::config::StorageOptions;

mod schema;

/// Serialized note collection.
pub const NOTES_KEY: &str = "notesJSON";
/// Serialized one-element array holding the active theme marker.
pub const THEME_KEY: &str = "theme";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("storage medium is unavailable")]
    Unavailable,
}

/// Synchronous key to string storage.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn describe(&self) -> String;
}

pub struct SqliteStore {
    db_path: PathBuf,
    conn: Connection,
}

impl SqliteStore {
    pub fn database_path(&self) -> &Path {
        &self.db_path
    }

    fn with_connection<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        f(&self.conn).map_err(StorageError::from)
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_connection(|conn| {
            conn.query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )
            .map(|_| ())
        })
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.db_path.display())
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    entries: HashMap<String, String>,
    writes: usize,
}

/// Process-lifetime store. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls so far.
    pub fn writes(&self) -> usize {
        self.inner.lock().writes
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.lock().entries.get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.raw(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.lock();
        inner.entries.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

/// Stand-in for a medium that refuses every read and write.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableStore;

impl KeyValueStore for UnavailableStore {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Err(StorageError::Unavailable)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable)
    }

    fn describe(&self) -> String {
        "unavailable".to_string()
    }
}

/// Infallible facade over a [`KeyValueStore`]. Failures are logged and the
/// caller carries on with its in-memory state.
pub struct PersistenceAdapter {
    backend: Box<dyn KeyValueStore>,
}

impl PersistenceAdapter {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(?err, key, backend = %self.backend.describe(), "storage read failed");
                None
            }
        }
    }

    pub fn set(&self, key: &str, value: &str) {
        if let Err(err) = self.backend.set(key, value) {
            tracing::warn!(?err, key, backend = %self.backend.describe(), "storage write failed");
        }
    }

    pub fn describe(&self) -> String {
        self.backend.describe()
    }
}

pub fn open(options: &StorageOptions) -> Result<SqliteStore> {
    let db_path = &options.database_path;
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    let conn = Connection::open(db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    prepare_connection(&conn)?;
    schema::apply(&conn)?;
    Ok(SqliteStore {
        db_path: db_path.clone(),
        conn,
    })
}

/// Picks the backend for a session. A database that cannot be opened leaves
/// the session running in memory only.
pub fn open_adapter(options: &StorageOptions) -> PersistenceAdapter {
    if options.ephemeral {
        tracing::info!("ephemeral session requested; notes will not outlive the process");
        return PersistenceAdapter::new(MemoryStore::new());
    }
    match open(options) {
        Ok(store) => {
            tracing::debug!(path = %store.database_path().display(), "opened note storage");
            PersistenceAdapter::new(store)
        }
        Err(err) => {
            tracing::warn!(?err, "note storage unavailable, continuing in memory");
            PersistenceAdapter::new(MemoryStore::new())
        }
    }
}

fn prepare_connection(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("setting journal_mode=WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .context("setting synchronous=NORMAL")?;
    Ok(())
}
