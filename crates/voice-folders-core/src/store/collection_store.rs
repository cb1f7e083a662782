use crate::{
    Collection, CoreError, CoreResult,
    store::{COLLECTION_KEY, PersistenceStore, StoreError},
};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;
use tracing::{debug, info, instrument};

/// Reads and writes the whole [`Collection`] as one JSON document.
///
/// There is no incremental persistence: every save overwrites the full
/// document.
#[derive(Clone)]
pub struct CollectionStore {
    store: Arc<dyn PersistenceStore>,
}

impl CollectionStore {
    /// Wrap a backend.
    pub fn new(store: Arc<dyn PersistenceStore>) -> Self {
        Self { store }
    }

    /// Load the collection, initializing an empty one on first run.
    ///
    /// # Errors
    ///
    /// - `StorageUnavailable` if the backend cannot be reached or read.
    /// - `CorruptCollection` if the stored document does not parse or
    ///   violates id uniqueness.
    /// - `StorageWriteError` if the empty first-run document cannot be
    ///   written.
    #[instrument(skip(self))]
    pub async fn load(&self) -> CoreResult<Collection> {
        self.store
            .ensure_container()
            .await
            .map_err(|e| CoreError::StorageUnavailable {
                reason: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let bytes = self
            .store
            .read(COLLECTION_KEY)
            .await
            .map_err(|e| CoreError::StorageUnavailable {
                reason: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        let Some(bytes) = bytes else {
            let empty = Collection::default();
            self.save(&empty).await?;
            info!("No stored collection found, initialized empty collection");
            return Ok(empty);
        };

        let collection: Collection =
            serde_json::from_slice(&bytes).map_err(|e| CoreError::CorruptCollection {
                reason: format!("Failed to parse collection: {}", e),
                location: ErrorLocation::from(Location::caller()),
            })?;

        collection
            .validate()
            .map_err(|reason| CoreError::CorruptCollection {
                reason,
                location: ErrorLocation::from(Location::caller()),
            })?;

        info!(folder_count = collection.len(), "Collection loaded");

        Ok(collection)
    }

    /// Overwrite the stored document with `collection`.
    ///
    /// # Errors
    ///
    /// Returns `StorageWriteError` if serialization or the backend write
    /// fails. The previously stored document is left intact in that case.
    #[instrument(skip(self, collection), fields(folder_count = collection.len()))]
    pub async fn save(&self, collection: &Collection) -> CoreResult<()> {
        let bytes = serde_json::to_vec(collection).map_err(|e| CoreError::StorageWriteError {
            reason: format!("Failed to serialize collection: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let len = bytes.len();
        self.store
            .write(COLLECTION_KEY, bytes)
            .await
            .map_err(|e| match e {
                StoreError::ReadFailed(reason)
                | StoreError::WriteFailed(reason)
                | StoreError::ContainerUnavailable(reason) => CoreError::StorageWriteError {
                    reason,
                    location: ErrorLocation::from(Location::caller()),
                },
            })?;

        debug!(bytes = len, "Collection saved");

        Ok(())
    }
}
