use crate::{
    AudioPlaybackAdapter, CoreError, CoreResult, Folder, FolderId, PlaybackSession, RecordingId,
    RepositoryHandle,
};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;
use tracing::{info, instrument, warn};

/// Folder browsing with its own library playback.
///
/// Switching or closing the open folder stops and unloads whatever the
/// library session is playing before the switch completes.
pub struct LibraryView {
    repository: RepositoryHandle,
    selected: Option<Folder>,
    playback: PlaybackSession,
}

impl LibraryView {
    /// Create a view with no folder open.
    pub fn new(repository: RepositoryHandle, adapter: Arc<dyn AudioPlaybackAdapter>) -> Self {
        Self {
            repository,
            selected: None,
            playback: PlaybackSession::new("library", adapter),
        }
    }

    /// The open folder, as of the last open or refresh.
    pub fn selected(&self) -> Option<&Folder> {
        self.selected.as_ref()
    }

    /// Library playback session (for observing state and completion).
    pub fn playback(&self) -> &PlaybackSession {
        &self.playback
    }

    /// Folders whose name contains `query`, ignoring case.
    pub fn folders(&self, query: &str) -> Vec<Folder> {
        self.repository
            .snapshot()
            .search(query)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Open `folder_id`, stopping any library playback first.
    ///
    /// # Errors
    ///
    /// Returns `FolderNotFound` if no such folder exists; the current
    /// selection and playback are left untouched in that case.
    #[instrument(skip(self))]
    pub async fn open_folder(&mut self, folder_id: &FolderId) -> CoreResult<&Folder> {
        let folder = self.repository.folder(folder_id)?;
        self.release_playback().await;

        info!(folder_id = %folder.id, recording_count = folder.len(), "Folder opened");

        Ok(self.selected.insert(folder))
    }

    /// Close the open folder, stopping any library playback.
    #[instrument(skip(self))]
    pub async fn close_folder(&mut self) {
        self.release_playback().await;
        self.selected = None;
    }

    /// Replace the open folder with a fresher copy of the same folder.
    ///
    /// Copies of other folders are ignored.
    pub fn refresh(&mut self, folder: Folder) {
        if let Some(selected) = &mut self.selected
            && selected.id == folder.id
        {
            *selected = folder;
        }
    }

    /// Play a recording of the open folder from the beginning.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if no folder is open, `ValidationError` if the
    /// recording is not in it, otherwise see [`PlaybackSession::play`].
    #[instrument(skip(self))]
    pub async fn play(&mut self, recording_id: &RecordingId) -> CoreResult<()> {
        let uri = self.recording_uri(recording_id)?;
        self.playback.play(&uri).await
    }

    /// Play a recording, or stop it if it is the one playing.
    ///
    /// # Errors
    ///
    /// Same as [`LibraryView::play`].
    pub async fn toggle(&mut self, recording_id: &RecordingId) -> CoreResult<()> {
        let uri = self.recording_uri(recording_id)?;
        self.playback.toggle(&uri).await
    }

    /// Stop library playback.
    ///
    /// # Errors
    ///
    /// See [`PlaybackSession::stop`].
    pub async fn stop(&mut self) -> CoreResult<()> {
        self.playback.stop().await
    }

    /// Stop and unload library playback.
    ///
    /// # Errors
    ///
    /// See [`PlaybackSession::release`].
    pub async fn release(&mut self) -> CoreResult<()> {
        self.playback.release().await
    }

    async fn release_playback(&mut self) {
        if let Err(e) = self.playback.release().await {
            warn!(error = ?e, "Library playback did not release cleanly");
        }
    }

    #[track_caller]
    fn recording_uri(&self, recording_id: &RecordingId) -> CoreResult<crate::ResourceHandle> {
        let folder = self
            .selected
            .as_ref()
            .ok_or_else(|| CoreError::InvalidTransition {
                action: "play a recording",
                state: "no folder is open",
                location: ErrorLocation::from(Location::caller()),
            })?;

        folder
            .recording(recording_id)
            .map(|r| r.uri.clone())
            .ok_or_else(|| CoreError::ValidationError {
                reason: format!("Recording {} is not in folder {}.", recording_id, folder.name),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}
