use crate::{
    Collection, CoreError, CoreResult, Folder, FolderId, Recording, RepositoryHandle,
    model::ids,
    repository::RepositoryCommand,
    store::CollectionStore,
};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

/// Capacity of the command queue feeding the repository task.
const COMMAND_QUEUE_CAPACITY: usize = 32;

/// Owner of the in-memory [`Collection`] and the only writer to storage.
///
/// Every mutation is applied to a copy, persisted, and only swapped in once
/// the write succeeded, so memory never runs ahead of durable state.
///
/// Use [`FolderRepository::spawn`] to move the repository onto its own task
/// and share it through a [`RepositoryHandle`]; that serializes all
/// mutations through one queue.
pub struct FolderRepository {
    collection: Collection,
    store: CollectionStore,
}

impl FolderRepository {
    /// Load the persisted collection (creating an empty one on first run).
    ///
    /// # Errors
    ///
    /// Propagates `StorageUnavailable`, `CorruptCollection` or
    /// `StorageWriteError` from [`CollectionStore::load`].
    #[instrument(skip(store))]
    pub async fn load(store: CollectionStore) -> CoreResult<Self> {
        let collection = store.load().await?;

        for id in collection.ids() {
            ids::advance_past(id);
        }

        info!(folder_count = collection.len(), "FolderRepository initialized");

        Ok(Self { collection, store })
    }

    /// Current collection.
    pub fn collection(&self) -> &Collection {
        &self.collection
    }

    /// Replace the whole collection and persist it.
    ///
    /// # Errors
    ///
    /// - `ValidationError` if `collection` has duplicate ids.
    /// - `StorageWriteError` if persisting fails; memory is left unchanged.
    #[instrument(skip(self, collection), fields(folder_count = collection.len()))]
    pub async fn save(&mut self, collection: Collection) -> CoreResult<()> {
        collection
            .validate()
            .map_err(|reason| CoreError::ValidationError {
                reason,
                location: ErrorLocation::from(Location::caller()),
            })?;

        self.commit(collection).await
    }

    /// Create an empty folder named `name` and persist the collection.
    ///
    /// The name is stored as given; it only has to contain something other
    /// than whitespace.
    ///
    /// # Errors
    ///
    /// - `ValidationError` for an empty or whitespace-only name (nothing is
    ///   mutated or written).
    /// - `StorageWriteError` if persisting fails.
    #[instrument(skip(self))]
    pub async fn create_folder(&mut self, name: &str) -> CoreResult<Folder> {
        if name.trim().is_empty() {
            return Err(CoreError::ValidationError {
                reason: "Folder name cannot be empty.".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let folder = Folder::new(name);
        let mut next = self.collection.clone();
        next.push(folder.clone());

        self.commit(next).await?;

        info!(folder_id = %folder.id, folder_name = %folder.name, "Folder created");

        Ok(folder)
    }

    /// Append `recording` to the folder `folder_id` and persist.
    ///
    /// Returns the updated folder; callers holding an older copy should
    /// replace it with this value.
    ///
    /// # Errors
    ///
    /// - `FolderNotFound` if no such folder exists.
    /// - `ValidationError` if the folder already holds a recording with the
    ///   same id.
    /// - `StorageWriteError` if persisting fails; memory is left unchanged.
    #[instrument(skip(self, recording), fields(recording_id = %recording.id))]
    pub async fn add_recording(
        &mut self,
        folder_id: &FolderId,
        recording: Recording,
    ) -> CoreResult<Folder> {
        let mut next = self.collection.clone();

        let folder = next
            .folder_mut(folder_id)
            .ok_or_else(|| CoreError::FolderNotFound {
                folder_id: folder_id.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })?;

        if folder.recording(&recording.id).is_some() {
            return Err(CoreError::ValidationError {
                reason: format!("Recording {} already exists in this folder.", recording.id),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        folder.recordings.push(recording);
        let updated = folder.clone();

        self.commit(next).await?;

        info!(
            folder_id = %updated.id,
            recording_count = updated.len(),
            "Recording added"
        );

        Ok(updated)
    }

    /// Move the repository onto its own task.
    ///
    /// Must be called from within a tokio runtime. The task ends once every
    /// [`RepositoryHandle`] has been dropped.
    pub fn spawn(mut self) -> RepositoryHandle {
        let (command_tx, mut command_rx) = mpsc::channel(COMMAND_QUEUE_CAPACITY);
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(self.collection.clone()));

        tokio::spawn(async move {
            while let Some(command) = command_rx.recv().await {
                match command {
                    RepositoryCommand::CreateFolder { name, reply } => {
                        let result = self.create_folder(&name).await;
                        self.publish_if_ok(&snapshot_tx, &result);
                        if reply.send(result).is_err() {
                            warn!("CreateFolder caller went away before reply");
                        }
                    }
                    RepositoryCommand::AddRecording {
                        folder_id,
                        recording,
                        reply,
                    } => {
                        let result = self.add_recording(&folder_id, recording).await;
                        self.publish_if_ok(&snapshot_tx, &result);
                        if reply.send(result).is_err() {
                            warn!("AddRecording caller went away before reply");
                        }
                    }
                    RepositoryCommand::Replace { collection, reply } => {
                        let result = self.save(collection).await;
                        self.publish_if_ok(&snapshot_tx, &result);
                        if reply.send(result).is_err() {
                            warn!("Replace caller went away before reply");
                        }
                    }
                }
            }

            debug!("All repository handles dropped, repository task stopped");
        });

        RepositoryHandle::new(command_tx, snapshot_rx)
    }

    fn publish_if_ok<T>(&self, snapshot_tx: &watch::Sender<Arc<Collection>>, result: &CoreResult<T>) {
        if result.is_ok() {
            snapshot_tx.send_replace(Arc::new(self.collection.clone()));
        }
    }

    async fn commit(&mut self, next: Collection) -> CoreResult<()> {
        self.store.save(&next).await?;
        self.collection = next;
        Ok(())
    }
}
