//! Voice Folders Core Library
//!
//! Voice memos organized into named folders: the folder collection and its
//! persistence, recording and playback session state machines, and cpal/hound
//! audio adapters.
//!
//! # Example
//!
//! ```no_run
//! use voice_folders_core::{
//!     CaptureDevice, CollectionStore, CoreResult, CpalCaptureAdapter, CpalPlaybackAdapter,
//!     FolderRepository, PlaybackSession, RecordingSession, SessionSettings, StorageProfile,
//!     open_store,
//! };
//!
//! use std::{path::Path, sync::Arc, time::Duration};
//!
//! #[tokio::main]
//! async fn main() -> CoreResult<()> {
//!     let data_dir = Path::new("voice-folders-data");
//!     let store = open_store(StorageProfile::File, data_dir)?;
//!     let repository = FolderRepository::load(CollectionStore::new(store)).await?.spawn();
//!
//!     let folder = repository.create_folder("Ideas").await?;
//!
//!     let device = CaptureDevice::new(Arc::new(CpalCaptureAdapter::new(data_dir.join("recordings"))));
//!     let preview = PlaybackSession::new("preview", Arc::new(CpalPlaybackAdapter::new()));
//!     let mut session =
//!         RecordingSession::new(device, repository.clone(), preview, SessionSettings::default());
//!
//!     session.start(&folder.id).await?;
//!     tokio::time::sleep(Duration::from_secs(3)).await;
//!     session.stop().await?;
//!     session.rename("Idea 1")?;
//!     let folder = session.commit().await?;
//!
//!     println!("{} now holds {} recording(s)", folder.name, folder.len());
//!     Ok(())
//! }
//! ```

mod adapter;
mod audio;
mod error;
mod model;
mod repository;
mod session;
mod store;

pub use {
    adapter::{
        AdapterError, AdapterFuture, AudioCaptureAdapter, AudioPlaybackAdapter, CaptureHandle,
        CapturedAudio, CompletionCallback, PermissionStatus, PlaybackHandle, QualityPreset,
        ResourceHandle,
    },
    audio::{CpalCaptureAdapter, CpalPlaybackAdapter},
    error::{CoreError, Result as CoreResult},
    model::{Collection, Folder, FolderId, Recording, RecordingId},
    repository::{FolderRepository, RepositoryHandle},
    session::{
        CaptureDevice, DEFAULT_START_TIMEOUT, LibraryView, PlaybackEvent, PlaybackSession,
        PlaybackState, PlaybackStatus, RecordingSession, RecordingStatus, SessionSettings,
        StagedRecording,
    },
    store::{
        COLLECTION_KEY, CollectionStore, FileStore, KEY_VALUE_DB_FILE, KeyValueStore,
        PersistenceStore, StorageProfile, StoreError, StoreFuture, open_store,
    },
};

#[cfg(test)]
mod tests;
