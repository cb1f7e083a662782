use crate::store::{COLLECTION_KEY, PersistenceStore, StoreError, StoreFuture};

use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use tracing::debug;

/// Directory under the root that holds every stored document.
const CONTAINER_DIR: &str = "folders";

/// File name used for the collection document.
const COLLECTION_FILE: &str = "folders.json";

/// Hierarchical file backend.
///
/// The collection lives at `<root>/folders/folders.json`; any other key `k`
/// is stored as `<root>/folders/k.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `root`. Nothing is touched on disk until
    /// [`PersistenceStore::ensure_container`] or a write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory that holds the stored documents.
    pub fn container(&self) -> PathBuf {
        self.root.join(CONTAINER_DIR)
    }

    /// File backing `key`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        if key == COLLECTION_KEY {
            self.container().join(COLLECTION_FILE)
        } else {
            self.container().join(format!("{key}.json"))
        }
    }
}

impl PersistenceStore for FileStore {
    fn read(&self, key: &str) -> StoreFuture<'_, Option<Vec<u8>>> {
        let path = self.path_for(key);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || read_file(&path))
                .await
                .map_err(|e| StoreError::ReadFailed(format!("Read task failed: {}", e)))?
        })
    }

    fn write(&self, key: &str, bytes: Vec<u8>) -> StoreFuture<'_, ()> {
        let path = self.path_for(key);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
                .await
                .map_err(|e| StoreError::WriteFailed(format!("Write task failed: {}", e)))?
        })
    }

    fn ensure_container(&self) -> StoreFuture<'_, ()> {
        let dir = self.container();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || {
                fs::create_dir_all(&dir).map_err(|e| {
                    StoreError::ContainerUnavailable(format!("Failed to create {:?}: {}", dir, e))
                })
            })
            .await
            .map_err(|e| StoreError::ContainerUnavailable(format!("Directory task failed: {}", e)))?
        })
    }
}

fn read_file(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StoreError::ReadFailed(format!(
            "Failed to read {:?}: {}",
            path, e
        ))),
    }
}

/// Write to a temporary sibling, fsync, then rename over the target so a
/// crash or a concurrent reader never observes a half-written document.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let temp_path = path.with_extension("json.tmp");

    let mut temp_file = fs::File::create(&temp_path).map_err(|e| {
        StoreError::WriteFailed(format!("Failed to create temp file {:?}: {}", temp_path, e))
    })?;

    temp_file
        .write_all(bytes)
        .map_err(|e| StoreError::WriteFailed(format!("Failed to write temp file: {}", e)))?;

    temp_file
        .sync_all()
        .map_err(|e| StoreError::WriteFailed(format!("Failed to sync temp file: {}", e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        StoreError::WriteFailed(format!("Failed to rename temp file to {:?}: {}", path, e))
    })?;

    debug!(path = ?path, bytes = bytes.len(), "Document written (atomic)");

    Ok(())
}
