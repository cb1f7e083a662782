//! Console rendering of session state.
//!
//! The view keeps no state of its own: it prints whatever the recording and
//! playback sessions publish, plus the one-off notices the application sends
//! in reply to commands.

use voice_folders_core::{
    Folder, PlaybackEvent, PlaybackState, PlaybackStatus, Recording, RecordingStatus,
};

use tokio::sync::{broadcast, mpsc, watch};
use tracing::{debug, info, instrument, warn};

/// Command reference printed by `help`.
pub(crate) const HELP: &str = "\
Commands:
  list [query]        show folders, optionally filtered by name
  new <name>          create a folder
  open <folder>       open a folder by id or name
  close               go back to the folder list
  record              start recording into the open folder
  done                stop recording and review it
  rename <name>       rename the recording under review
  preview             play or stop the recording under review
  save                save the recording under review
  discard             throw the recording under review away
  play <recording>    play a recording of the open folder
  toggle <recording>  play a recording, or stop it if playing
  pause               stop playback
  help                show this list
  quit                exit";

/// One-off replies from the application to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Result of a folder listing or search.
    Folders(Vec<Folder>),
    /// A folder was created.
    FolderCreated(Folder),
    /// A folder was opened.
    FolderOpened(Folder),
    /// The open folder was closed.
    FolderClosed,
    /// The staged recording was committed into this folder.
    Saved(Folder),
    /// Command reference.
    Help,
    /// A command failed.
    Error(String),
}

/// Receivers the view observes.
pub struct ConsoleView {
    pub(crate) recording_rx: watch::Receiver<RecordingStatus>,
    pub(crate) preview_rx: watch::Receiver<PlaybackStatus>,
    pub(crate) library_rx: watch::Receiver<PlaybackStatus>,
    pub(crate) library_events: broadcast::Receiver<PlaybackEvent>,
    pub(crate) notice_rx: mpsc::Receiver<Notice>,
}

impl ConsoleView {
    /// Print state changes until shutdown is signalled.
    #[instrument(skip_all)]
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<bool>) {
        println!("{}", render_notice(&Notice::Help));

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Console view shutting down");
                    break;
                }

                Ok(()) = self.recording_rx.changed() => {
                    let status = self.recording_rx.borrow_and_update().clone();
                    println!("{}", render_recording(&status));
                }

                Ok(()) = self.preview_rx.changed() => {
                    let status = self.preview_rx.borrow_and_update().clone();
                    if let Some(line) = render_playback("Preview", &status) {
                        println!("{line}");
                    }
                }

                Ok(()) = self.library_rx.changed() => {
                    let status = self.library_rx.borrow_and_update().clone();
                    if let Some(line) = render_playback("Playback", &status) {
                        println!("{line}");
                    }
                }

                event = self.library_events.recv() => {
                    match event {
                        Ok(PlaybackEvent::Completed { resource }) => {
                            debug!(resource = %resource, "Library playback completed");
                            println!("Finished playing.");
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!(skipped, "Console view missed playback events");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            debug!("Library playback events closed");
                        }
                    }
                }

                Some(notice) = self.notice_rx.recv() => {
                    println!("{}", render_notice(&notice));
                }

                else => {
                    info!("All view channels closed");
                    break;
                }
            }
        }
    }
}

/// Line describing the recording session.
pub(crate) fn render_recording(status: &RecordingStatus) -> String {
    match status {
        RecordingStatus::Idle => "Ready.".to_string(),
        RecordingStatus::Starting { .. } => "Starting microphone...".to_string(),
        RecordingStatus::Capturing { started_at, .. } => format!(
            "Recording since {}. Type `done` to stop.",
            started_at.format("%H:%M:%S")
        ),
        RecordingStatus::Finalizing { .. } => "Finishing recording...".to_string(),
        RecordingStatus::Staged {
            draft, last_error, ..
        } => {
            let mut line = format!(
                "Review \"{}\" ({}): rename, preview, save or discard.",
                draft.name,
                format_duration(draft.duration)
            );
            if let Some(error) = last_error {
                line.push_str(&format!("\n  Last save failed: {error}"));
            }
            line
        }
    }
}

/// Line describing a playback session, or `None` while it is only loading.
pub(crate) fn render_playback(label: &str, status: &PlaybackStatus) -> Option<String> {
    match (status.state, &status.resource) {
        (PlaybackState::Loading, _) => None,
        (PlaybackState::Playing, Some(resource)) => Some(format!("{label}: playing {resource}")),
        (PlaybackState::Playing, None) => Some(format!("{label}: playing")),
        (PlaybackState::Stopped, _) => Some(format!("{label}: stopped")),
    }
}

/// Text printed for a notice.
pub(crate) fn render_notice(notice: &Notice) -> String {
    match notice {
        Notice::Folders(folders) if folders.is_empty() => "No folders.".to_string(),
        Notice::Folders(folders) => folders
            .iter()
            .map(render_folder_row)
            .collect::<Vec<_>>()
            .join("\n"),
        Notice::FolderCreated(folder) => format!("Created folder \"{}\" ({}).", folder.name, folder.id),
        Notice::FolderOpened(folder) => {
            let mut text = format!("{}:", folder.name);
            if folder.is_empty() {
                text.push_str("\n  No recordings yet. Type `record` to add one.");
            }
            for recording in &folder.recordings {
                text.push('\n');
                text.push_str(&render_recording_row(recording));
            }
            text
        }
        Notice::FolderClosed => "Closed folder.".to_string(),
        Notice::Saved(folder) => format!(
            "Saved. \"{}\" now holds {} recording(s).",
            folder.name,
            folder.len()
        ),
        Notice::Help => HELP.to_string(),
        Notice::Error(message) => format!("Error: {message}"),
    }
}

fn render_folder_row(folder: &Folder) -> String {
    format!("  {}  {}  ({} recordings)", folder.id, folder.name, folder.len())
}

fn render_recording_row(recording: &Recording) -> String {
    format!(
        "  {}  {}  {}  {}",
        recording.id,
        recording.name,
        format_duration(recording.duration),
        recording.created_at.format("%Y-%m-%d %H:%M")
    )
}

/// `m:ss` with zero-padded seconds.
pub(crate) fn format_duration(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
