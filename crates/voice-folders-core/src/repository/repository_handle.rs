use crate::{Collection, CoreError, CoreResult, Folder, FolderId, Recording};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;
use tokio::sync::{mpsc, oneshot, watch};

/// Requests processed in order by the repository task.
pub(crate) enum RepositoryCommand {
    CreateFolder {
        name: String,
        reply: oneshot::Sender<CoreResult<Folder>>,
    },
    AddRecording {
        folder_id: FolderId,
        recording: Recording,
        reply: oneshot::Sender<CoreResult<Folder>>,
    },
    Replace {
        collection: Collection,
        reply: oneshot::Sender<CoreResult<()>>,
    },
}

/// Cloneable access to a spawned [`FolderRepository`](crate::FolderRepository).
///
/// Reads are served from the latest published snapshot. Mutations are
/// queued to the repository task and applied one at a time, so concurrent
/// callers never lose each other's updates.
#[derive(Clone)]
pub struct RepositoryHandle {
    command_tx: mpsc::Sender<RepositoryCommand>,
    snapshot_rx: watch::Receiver<Arc<Collection>>,
}

impl RepositoryHandle {
    pub(crate) fn new(
        command_tx: mpsc::Sender<RepositoryCommand>,
        snapshot_rx: watch::Receiver<Arc<Collection>>,
    ) -> Self {
        Self {
            command_tx,
            snapshot_rx,
        }
    }

    /// Immutable view of the collection as of the last successful mutation.
    pub fn snapshot(&self) -> Arc<Collection> {
        Arc::clone(&self.snapshot_rx.borrow())
    }

    /// Receive a fresh snapshot after every successful mutation.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Collection>> {
        self.snapshot_rx.clone()
    }

    /// Copy of the folder `folder_id` from the latest snapshot.
    ///
    /// # Errors
    ///
    /// Returns `FolderNotFound` if no such folder exists.
    #[track_caller]
    pub fn folder(&self, folder_id: &FolderId) -> CoreResult<Folder> {
        self.snapshot_rx
            .borrow()
            .folder(folder_id)
            .cloned()
            .ok_or_else(|| CoreError::FolderNotFound {
                folder_id: folder_id.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }

    /// See [`FolderRepository::create_folder`](crate::FolderRepository::create_folder).
    pub async fn create_folder(&self, name: impl Into<String>) -> CoreResult<Folder> {
        let (reply, reply_rx) = oneshot::channel();
        self.request(
            RepositoryCommand::CreateFolder {
                name: name.into(),
                reply,
            },
            reply_rx,
        )
        .await
    }

    /// See [`FolderRepository::add_recording`](crate::FolderRepository::add_recording).
    pub async fn add_recording(
        &self,
        folder_id: &FolderId,
        recording: Recording,
    ) -> CoreResult<Folder> {
        let (reply, reply_rx) = oneshot::channel();
        self.request(
            RepositoryCommand::AddRecording {
                folder_id: folder_id.clone(),
                recording,
                reply,
            },
            reply_rx,
        )
        .await
    }

    /// See [`FolderRepository::save`](crate::FolderRepository::save).
    pub async fn replace_collection(&self, collection: Collection) -> CoreResult<()> {
        let (reply, reply_rx) = oneshot::channel();
        self.request(RepositoryCommand::Replace { collection, reply }, reply_rx)
            .await
    }

    async fn request<T>(
        &self,
        command: RepositoryCommand,
        reply_rx: oneshot::Receiver<CoreResult<T>>,
    ) -> CoreResult<T> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| CoreError::RepositoryClosed {
                location: ErrorLocation::from(Location::caller()),
            })?;

        reply_rx.await.map_err(|_| CoreError::RepositoryClosed {
            location: ErrorLocation::from(Location::caller()),
        })?
    }
}
