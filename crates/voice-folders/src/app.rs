use crate::{AppCommand, AppError, AppResult, Notice};

use voice_folders_core::{
    Folder, FolderId, LibraryView, RecordingId, RecordingSession, RepositoryHandle,
};

use std::panic::Location;

use error_location::ErrorLocation;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, instrument, warn};

/// Main application state.
///
/// Owns both sessions and applies console commands to them one at a time, so
/// session transitions never interleave. Rendering happens elsewhere by
/// observing the sessions' published state.
pub struct App {
    pub(crate) repository: RepositoryHandle,
    pub(crate) recording: RecordingSession,
    pub(crate) library: LibraryView,
    pub(crate) command_rx: mpsc::Receiver<AppCommand>,
    pub(crate) notice_tx: mpsc::Sender<Notice>,
    pub(crate) shutdown_tx: watch::Sender<bool>,
}

impl App {
    /// Run the command loop until shutdown, then tear both sessions down.
    #[instrument(skip(self))]
    pub(crate) async fn run(mut self) -> AppResult<()> {
        info!("Voice Folders starting");

        loop {
            match self.command_rx.recv().await {
                Some(AppCommand::Shutdown) => {
                    info!("Shutdown requested");
                    break;
                }
                Some(command) => {
                    let reply = match self.handle(command).await {
                        Ok(reply) => reply,
                        Err(e) => {
                            error!(error = ?e, "Command failed");
                            Some(Notice::Error(e.user_message()))
                        }
                    };
                    if let Some(notice) = reply {
                        self.notify(notice).await;
                    }
                }
                None => {
                    info!("Command channel closed, shutting down");
                    break;
                }
            }
        }

        self.recording.teardown().await;
        if let Err(e) = self.library.release().await {
            warn!(error = ?e, "Library playback did not release on shutdown");
        }

        let _ = self.shutdown_tx.send(true);
        info!("Voice Folders shut down successfully");

        Ok(())
    }

    /// Apply one command. Returns the notice to print, if any; state changes
    /// are rendered from the session channels instead.
    #[instrument(skip(self))]
    pub(crate) async fn handle(&mut self, command: AppCommand) -> AppResult<Option<Notice>> {
        let notice = match command {
            AppCommand::ListFolders { query } => Some(Notice::Folders(self.library.folders(&query))),
            AppCommand::CreateFolder { name } => {
                let folder = self.repository.create_folder(name).await?;
                Some(Notice::FolderCreated(folder))
            }
            AppCommand::OpenFolder { target } => {
                let folder_id = resolve_folder(self.repository.snapshot().folders(), &target)?;
                let folder = self.library.open_folder(&folder_id).await?;
                Some(Notice::FolderOpened(folder.clone()))
            }
            AppCommand::CloseFolder => {
                self.library.close_folder().await;
                Some(Notice::FolderClosed)
            }
            AppCommand::StartRecording => {
                let folder_id = self.open_folder_id()?;
                self.stop_library_playback().await;
                self.recording.start(&folder_id).await?;
                None
            }
            AppCommand::StopRecording => {
                self.recording.stop().await?;
                None
            }
            AppCommand::RenameStaged { name } => {
                self.recording.rename(&name)?;
                None
            }
            AppCommand::TogglePreview => {
                self.stop_library_playback().await;
                self.recording.toggle_preview().await?;
                None
            }
            AppCommand::SaveStaged => {
                let folder = self.recording.commit().await?;
                self.library.refresh(folder.clone());
                Some(Notice::Saved(folder))
            }
            AppCommand::DiscardStaged => {
                self.recording.discard().await?;
                None
            }
            AppCommand::PlayRecording { target } => {
                let recording_id = self.resolve_in_open_folder(&target)?;
                self.stop_preview().await;
                self.library.play(&recording_id).await?;
                None
            }
            AppCommand::ToggleRecording { target } => {
                let recording_id = self.resolve_in_open_folder(&target)?;
                self.stop_preview().await;
                self.library.toggle(&recording_id).await?;
                None
            }
            AppCommand::StopPlayback => {
                self.library.stop().await?;
                None
            }
            AppCommand::Help => Some(Notice::Help),
            AppCommand::Shutdown => None,
        };

        Ok(notice)
    }

    async fn notify(&self, notice: Notice) {
        if self.notice_tx.send(notice).await.is_err() {
            warn!("Console view is gone, dropping notice");
        }
    }

    #[track_caller]
    fn open_folder_id(&self) -> AppResult<FolderId> {
        self.library
            .selected()
            .map(|folder| folder.id.clone())
            .ok_or_else(|| invalid("record", "Open a folder first."))
    }

    #[track_caller]
    fn resolve_in_open_folder(&self, target: &str) -> AppResult<RecordingId> {
        let folder = self
            .library
            .selected()
            .ok_or_else(|| invalid(target, "Open a folder first."))?;
        resolve_recording(folder, target)
    }

    async fn stop_library_playback(&mut self) {
        if let Err(e) = self.library.stop().await {
            warn!(error = ?e, "Library playback did not stop");
        }
    }

    async fn stop_preview(&mut self) {
        if let Err(e) = self.recording.stop_preview().await {
            warn!(error = ?e, "Preview playback did not stop");
        }
    }
}

/// Find a folder by exact id, else by case-insensitive name.
///
/// # Errors
///
/// `InvalidCommand` if nothing matches or the name is shared by several
/// folders.
#[track_caller]
pub(crate) fn resolve_folder(folders: &[Folder], target: &str) -> AppResult<FolderId> {
    if let Some(folder) = folders.iter().find(|f| f.id.as_str() == target) {
        return Ok(folder.id.clone());
    }

    let mut matches = folders.iter().filter(|f| f.name.eq_ignore_ascii_case(target));
    match (matches.next(), matches.next()) {
        (Some(folder), None) => Ok(folder.id.clone()),
        (Some(_), Some(_)) => Err(invalid(
            target,
            &format!("Several folders are named \"{target}\". Use the folder id."),
        )),
        (None, _) => Err(invalid(target, &format!("No folder named \"{target}\"."))),
    }
}

/// Find a recording of `folder` by exact id, else by case-insensitive name.
///
/// # Errors
///
/// `InvalidCommand` if nothing matches or the name is shared.
#[track_caller]
pub(crate) fn resolve_recording(folder: &Folder, target: &str) -> AppResult<RecordingId> {
    if let Some(recording) = folder.recordings.iter().find(|r| r.id.as_str() == target) {
        return Ok(recording.id.clone());
    }

    let mut matches = folder
        .recordings
        .iter()
        .filter(|r| r.name.eq_ignore_ascii_case(target));
    match (matches.next(), matches.next()) {
        (Some(recording), None) => Ok(recording.id.clone()),
        (Some(_), Some(_)) => Err(invalid(
            target,
            &format!("Several recordings are named \"{target}\". Use the recording id."),
        )),
        (None, _) => Err(invalid(
            target,
            &format!("No recording named \"{target}\" in {}.", folder.name),
        )),
    }
}

#[track_caller]
fn invalid(input: &str, reason: &str) -> AppError {
    AppError::InvalidCommand {
        input: input.to_string(),
        reason: reason.to_string(),
        location: ErrorLocation::from(Location::caller()),
    }
}
