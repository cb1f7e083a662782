use crate::store::{PersistenceStore, StoreError, StoreFuture};

use std::{
    path::Path,
    sync::{Arc, Mutex},
};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, error, info, instrument};

/// Key-value backend on a single SQLite table.
///
/// Each write is one upsert statement, so a reader sees either the old or
/// the new value.
#[derive(Clone)]
pub struct KeyValueStore {
    conn: Arc<Mutex<Connection>>,
}

impl KeyValueStore {
    /// Open (or create) the database at `path`.
    #[instrument]
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| {
            StoreError::ContainerUnavailable(format!("Failed to open database {:?}: {}", path, e))
        })?;
        let store = Self::init(conn)?;
        info!(db_path = ?path, "Key-value store opened");
        Ok(store)
    }

    /// Open a throwaway database that lives only as long as the store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            StoreError::ContainerUnavailable(format!("Failed to open in-memory database: {}", e))
        })?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value BLOB NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| StoreError::ContainerUnavailable(format!("Failed to initialize schema: {}", e)))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl PersistenceStore for KeyValueStore {
    fn read(&self, key: &str) -> StoreFuture<'_, Option<Vec<u8>>> {
        let conn = Arc::clone(&self.conn);
        let key = key.to_string();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || {
                let conn = conn.lock().unwrap_or_else(|e| {
                    error!("Key-value connection lock poisoned, recovering: {}", e);
                    e.into_inner()
                });
                conn.query_row(
                    "SELECT value FROM kv_store WHERE key = ?1",
                    params![key],
                    |row| row.get::<_, Vec<u8>>(0),
                )
                .optional()
                .map_err(|e| StoreError::ReadFailed(format!("Failed to read key {}: {}", key, e)))
            })
            .await
            .map_err(|e| StoreError::ReadFailed(format!("Read task failed: {}", e)))?
        })
    }

    fn write(&self, key: &str, bytes: Vec<u8>) -> StoreFuture<'_, ()> {
        let conn = Arc::clone(&self.conn);
        let key = key.to_string();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
                let conn = conn.lock().unwrap_or_else(|e| {
                    error!("Key-value connection lock poisoned, recovering: {}", e);
                    e.into_inner()
                });
                conn.execute(
                    "INSERT INTO kv_store(key, value, updated_at) VALUES(?1, ?2, ?3)
                     ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
                    params![key, bytes, Utc::now().to_rfc3339()],
                )
                .map_err(|e| StoreError::WriteFailed(format!("Failed to write key {}: {}", key, e)))?;

                debug!(key = %key, bytes = bytes.len(), "Key written");
                Ok(())
            })
            .await
            .map_err(|e| StoreError::WriteFailed(format!("Write task failed: {}", e)))?
        })
    }
}
