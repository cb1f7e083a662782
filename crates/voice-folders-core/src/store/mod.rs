//! Durable storage for the folder collection.
//!
//! Two interchangeable backends implement [`PersistenceStore`]: a SQLite
//! key-value table and a plain file tree. Which one is used is decided once
//! at startup from the [`StorageProfile`].

mod collection_store;
mod file_store;
mod key_value_store;

pub use {
    collection_store::CollectionStore, file_store::FileStore, key_value_store::KeyValueStore,
};

use crate::{CoreError, CoreResult};

use std::{fs, future::Future, panic::Location, path::Path, pin::Pin, sync::Arc};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

/// Key under which the collection document is stored.
pub const COLLECTION_KEY: &str = "audio_folders";

/// File name of the SQLite database used by the key-value profile.
pub const KEY_VALUE_DB_FILE: &str = "voice-folders.sqlite3";

/// Failures reported by a [`PersistenceStore`] backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Reading a key failed for a reason other than absence.
    #[error("read failed: {0}")]
    ReadFailed(String),

    /// Writing a key failed; the previous value is still in place.
    #[error("write failed: {0}")]
    WriteFailed(String),

    /// The backing database or directory could not be opened or created.
    #[error("container unavailable: {0}")]
    ContainerUnavailable(String),
}

/// Boxed future returned by store operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Blob storage keyed by string.
pub trait PersistenceStore: Send + Sync {
    /// Read the blob under `key`; `None` when nothing has been written yet.
    fn read(&self, key: &str) -> StoreFuture<'_, Option<Vec<u8>>>;

    /// Replace the blob under `key`. Readers see either the old or the new
    /// value, never a partial write.
    fn write(&self, key: &str, bytes: Vec<u8>) -> StoreFuture<'_, ()>;

    /// Create whatever container the backend needs before the first access.
    fn ensure_container(&self) -> StoreFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}

/// Which storage backend to use for this installation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageProfile {
    /// `folders/folders.json` under the data directory.
    #[default]
    File,
    /// A SQLite key-value table in the data directory.
    KeyValue,
}

/// Open the backend for `profile` rooted at `data_dir`.
///
/// # Errors
///
/// Returns `StorageUnavailable` if the data directory or database cannot be
/// created.
#[track_caller]
#[instrument]
pub fn open_store(profile: StorageProfile, data_dir: &Path) -> CoreResult<Arc<dyn PersistenceStore>> {
    fs::create_dir_all(data_dir).map_err(|e| CoreError::StorageUnavailable {
        reason: format!("Failed to create data directory {:?}: {}", data_dir, e),
        location: ErrorLocation::from(Location::caller()),
    })?;

    let store: Arc<dyn PersistenceStore> = match profile {
        StorageProfile::File => Arc::new(FileStore::new(data_dir)),
        StorageProfile::KeyValue => {
            let db_path = data_dir.join(KEY_VALUE_DB_FILE);
            let store = KeyValueStore::open(&db_path).map_err(|e| CoreError::StorageUnavailable {
                reason: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;
            Arc::new(store)
        }
    };

    info!(profile = ?profile, data_dir = ?data_dir, "Persistence store opened");

    Ok(store)
}
