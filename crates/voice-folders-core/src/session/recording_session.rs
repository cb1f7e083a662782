use crate::{
    AdapterError, CaptureDevice, CoreError, CoreResult, Folder, FolderId, PermissionStatus,
    PlaybackSession, QualityPreset, Recording, RecordingStatus, RepositoryHandle,
    session::capture_device::CaptureGuard,
};

use std::{panic::Location, time::Duration};

use chrono::Utc;
use error_location::ErrorLocation;
use tokio::sync::watch;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// Default bound on permission grant plus device start.
pub const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(10);

/// Tunables for a [`RecordingSession`].
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    /// Encoding quality requested from the capture adapter.
    pub preset: QualityPreset,
    /// How long `start` may wait for permission and device start.
    pub start_timeout: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            preset: QualityPreset::default(),
            start_timeout: DEFAULT_START_TIMEOUT,
        }
    }
}

/// A finalized capture waiting to be committed or discarded.
#[derive(Debug, Clone)]
pub struct StagedRecording {
    session_id: Uuid,
    folder_id: FolderId,
    draft: Recording,
    last_error: Option<String>,
}

impl StagedRecording {
    /// Folder the draft will be appended to.
    pub fn folder_id(&self) -> &FolderId {
        &self.folder_id
    }

    /// The draft as it would be committed now.
    pub fn draft(&self) -> &Recording {
        &self.draft
    }

    /// Why the last commit attempt failed, if it did.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

struct ActiveCapture {
    session_id: Uuid,
    folder_id: FolderId,
    guard: CaptureGuard,
}

enum SessionState {
    Idle,
    Capturing(ActiveCapture),
    Staged(StagedRecording),
}

impl SessionState {
    fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Capturing(_) => "recording",
            SessionState::Staged(_) => "a recording is waiting to be saved",
        }
    }
}

/// Lifecycle of one capture: `Idle -> Capturing -> Staged -> Idle`.
///
/// Stopping a capture stages a draft with a default name and preloads it on
/// the session's own preview [`PlaybackSession`]. The draft can be renamed
/// and previewed, then committed to its folder through the repository or
/// discarded. A failed commit keeps the draft staged so it can be retried.
///
/// All transitions take `&mut self`: a `stop` can never interleave with an
/// unfinished `start` on the same session. Across sessions, the shared
/// [`CaptureDevice`] admits a single capture at a time.
pub struct RecordingSession {
    device: CaptureDevice,
    repository: RepositoryHandle,
    preview: PlaybackSession,
    settings: SessionSettings,
    state: SessionState,
    status_tx: watch::Sender<RecordingStatus>,
}

impl RecordingSession {
    /// Create an idle session.
    pub fn new(
        device: CaptureDevice,
        repository: RepositoryHandle,
        preview: PlaybackSession,
        settings: SessionSettings,
    ) -> Self {
        let (status_tx, _) = watch::channel(RecordingStatus::Idle);

        Self {
            device,
            repository,
            preview,
            settings,
            state: SessionState::Idle,
            status_tx,
        }
    }

    /// Current status.
    pub fn status(&self) -> RecordingStatus {
        self.status_tx.borrow().clone()
    }

    /// Observe every transition.
    pub fn subscribe(&self) -> watch::Receiver<RecordingStatus> {
        self.status_tx.subscribe()
    }

    /// The staged draft, if any.
    pub fn staged(&self) -> Option<&StagedRecording> {
        match &self.state {
            SessionState::Staged(staged) => Some(staged),
            _ => None,
        }
    }

    /// Playback session used for previewing the staged draft.
    pub fn preview(&self) -> &PlaybackSession {
        &self.preview
    }

    /// Begin capturing into `folder_id`.
    ///
    /// # Errors
    ///
    /// - `SessionBusy` if this or any other session is capturing.
    /// - `InvalidTransition` if a draft is still staged.
    /// - `FolderNotFound` if the target folder does not exist.
    /// - `PermissionDenied`, `DeviceUnavailable` or `CaptureStartTimeout`
    ///   if the device cannot be started. The session stays idle.
    #[instrument(skip(self))]
    pub async fn start(&mut self, folder_id: &FolderId) -> CoreResult<()> {
        match &self.state {
            SessionState::Idle => {}
            SessionState::Capturing(_) => {
                return Err(CoreError::SessionBusy {
                    location: ErrorLocation::from(Location::caller()),
                });
            }
            state @ SessionState::Staged(_) => {
                return Err(CoreError::InvalidTransition {
                    action: "start recording",
                    state: state.label(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        }

        self.repository.folder(folder_id)?;
        let permit = self.device.try_acquire()?;

        let session_id = Uuid::new_v4();
        self.publish(RecordingStatus::Starting {
            session_id,
            folder_id: folder_id.clone(),
        });

        let adapter = self.device.adapter();
        let preset = self.settings.preset;
        let timeout = self.settings.start_timeout;

        let started = tokio::time::timeout(timeout, async {
            match adapter.request_permission().await {
                Ok(PermissionStatus::Granted) => {}
                Ok(PermissionStatus::Denied) | Err(AdapterError::PermissionDenied) => {
                    return Err(CoreError::PermissionDenied {
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
                Err(e) => {
                    return Err(CoreError::DeviceUnavailable {
                        reason: format!("Permission request failed: {}", e),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
            }

            adapter.start(preset).await.map_err(|e| match e {
                AdapterError::PermissionDenied => CoreError::PermissionDenied {
                    location: ErrorLocation::from(Location::caller()),
                },
                other => CoreError::DeviceUnavailable {
                    reason: other.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                },
            })
        })
        .await;

        let handle = match started {
            Ok(Ok(handle)) => handle,
            Ok(Err(e)) => {
                self.publish(RecordingStatus::Idle);
                warn!(session_id = %session_id, error = ?e, "Capture failed to start");
                return Err(e);
            }
            Err(_) => {
                self.publish(RecordingStatus::Idle);
                warn!(
                    session_id = %session_id,
                    timeout_ms = timeout.as_millis(),
                    "Capture start timed out"
                );
                return Err(CoreError::CaptureStartTimeout {
                    timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        self.state = SessionState::Capturing(ActiveCapture {
            session_id,
            folder_id: folder_id.clone(),
            guard: CaptureGuard::new(adapter, handle, permit, session_id),
        });
        self.publish(RecordingStatus::Capturing {
            session_id,
            folder_id: folder_id.clone(),
            started_at: Utc::now(),
        });

        info!(session_id = %session_id, folder_id = %folder_id, "Capture started");

        Ok(())
    }

    /// Stop capturing and stage the result.
    ///
    /// The draft is named `"Recording N"` where `N` is one more than the
    /// number of recordings currently in the target folder, and is
    /// preloaded for preview. A preview that fails to load is logged and
    /// the draft is staged anyway.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if not capturing.
    /// - `CaptureFinalizeError` if the adapter fails to finalize; the
    ///   device is released and the session returns to idle.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> CoreResult<Recording> {
        let capture = match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Capturing(capture) => capture,
            other => {
                let state = other.label();
                self.state = other;
                return Err(CoreError::InvalidTransition {
                    action: "stop recording",
                    state,
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        let ActiveCapture {
            session_id,
            folder_id,
            guard,
        } = capture;

        self.publish(RecordingStatus::Finalizing { session_id });

        let captured = match guard.finish().await {
            Ok(captured) => captured,
            Err(e) => {
                self.publish(RecordingStatus::Idle);
                error!(session_id = %session_id, error = ?e, "Capture finalize failed");
                return Err(CoreError::CaptureFinalizeError {
                    reason: e.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        let existing = match self.repository.folder(&folder_id) {
            Ok(folder) => folder.len(),
            Err(e) => {
                warn!(session_id = %session_id, error = ?e, "Target folder missing while staging");
                0
            }
        };

        let draft = Recording::draft(
            Recording::default_name(existing),
            captured.resource.clone(),
            captured.duration_secs,
        );

        if let Err(e) = self.preview.load(&captured.resource).await {
            warn!(session_id = %session_id, error = ?e, "Preview unavailable for staged recording");
        }

        self.state = SessionState::Staged(StagedRecording {
            session_id,
            folder_id,
            draft: draft.clone(),
            last_error: None,
        });
        self.publish_staged();

        info!(
            session_id = %session_id,
            resource = %draft.uri,
            duration_secs = draft.duration,
            "Capture staged"
        );

        Ok(draft)
    }

    /// Rename the staged draft. Nothing is persisted.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if nothing is staged.
    #[instrument(skip(self))]
    pub fn rename(&mut self, name: &str) -> CoreResult<()> {
        let staged = self.staged_mut("rename the recording")?;
        staged.draft.name = name.to_string();
        self.publish_staged();
        Ok(())
    }

    /// Play the staged draft, or stop it if it is already playing.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if nothing is staged; otherwise see
    /// [`PlaybackSession::toggle`].
    pub async fn toggle_preview(&mut self) -> CoreResult<()> {
        let uri = self.staged_mut("preview")?.draft.uri.clone();
        self.preview.toggle(&uri).await
    }

    /// Stop the preview if it is playing.
    ///
    /// # Errors
    ///
    /// See [`PlaybackSession::stop`].
    pub async fn stop_preview(&mut self) -> CoreResult<()> {
        self.preview.stop().await
    }

    /// Append the staged draft to its folder and persist.
    ///
    /// Returns the updated folder so callers can replace stale copies.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if nothing is staged.
    /// - Any repository error (`StorageWriteError`, `FolderNotFound`, ...).
    ///   The draft stays staged with the error recorded so the commit can
    ///   be retried.
    #[instrument(skip(self))]
    pub async fn commit(&mut self) -> CoreResult<Folder> {
        let staged = self.staged_mut("save the recording")?;
        let session_id = staged.session_id;
        let folder_id = staged.folder_id.clone();
        let draft = staged.draft.clone();

        if let Err(e) = self.preview.release().await {
            warn!(session_id = %session_id, error = ?e, "Preview did not release cleanly");
        }

        match self.repository.add_recording(&folder_id, draft).await {
            Ok(folder) => {
                self.state = SessionState::Idle;
                self.publish(RecordingStatus::Idle);
                info!(
                    session_id = %session_id,
                    folder_id = %folder.id,
                    recording_count = folder.len(),
                    "Recording committed"
                );
                Ok(folder)
            }
            Err(e) => {
                if let SessionState::Staged(staged) = &mut self.state {
                    staged.last_error = Some(e.user_message());
                }
                self.publish_staged();
                error!(session_id = %session_id, error = ?e, "Commit failed, draft kept for retry");
                Err(e)
            }
        }
    }

    /// Drop the staged draft without persisting it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` if nothing is staged.
    #[instrument(skip(self))]
    pub async fn discard(&mut self) -> CoreResult<()> {
        let session_id = self.staged_mut("discard the recording")?.session_id;

        if let Err(e) = self.preview.release().await {
            warn!(session_id = %session_id, error = ?e, "Preview did not release cleanly");
        }

        self.state = SessionState::Idle;
        self.publish(RecordingStatus::Idle);

        info!(session_id = %session_id, "Staged recording discarded");

        Ok(())
    }

    /// Release everything the session holds and return to idle.
    ///
    /// An in-progress capture is stopped and its audio dropped; a staged
    /// draft is discarded.
    #[instrument(skip(self))]
    pub async fn teardown(&mut self) {
        match std::mem::replace(&mut self.state, SessionState::Idle) {
            SessionState::Idle => {}
            SessionState::Capturing(capture) => {
                match capture.guard.finish().await {
                    Ok(captured) => warn!(
                        session_id = %capture.session_id,
                        resource = %captured.resource,
                        "Capture stopped by teardown, audio not saved"
                    ),
                    Err(e) => error!(
                        session_id = %capture.session_id,
                        error = ?e,
                        "Capture stop failed during teardown"
                    ),
                }
            }
            SessionState::Staged(staged) => {
                warn!(session_id = %staged.session_id, "Staged recording dropped by teardown");
            }
        }

        if let Err(e) = self.preview.release().await {
            warn!(error = ?e, "Preview did not release cleanly during teardown");
        }

        self.publish(RecordingStatus::Idle);
    }

    #[track_caller]
    fn staged_mut(&mut self, action: &'static str) -> CoreResult<&mut StagedRecording> {
        match &mut self.state {
            SessionState::Staged(staged) => Ok(staged),
            other => Err(CoreError::InvalidTransition {
                action,
                state: other.label(),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    fn publish_staged(&self) {
        if let SessionState::Staged(staged) = &self.state {
            self.publish(RecordingStatus::Staged {
                session_id: staged.session_id,
                folder_id: staged.folder_id.clone(),
                draft: staged.draft.clone(),
                last_error: staged.last_error.clone(),
            });
        }
    }

    fn publish(&self, status: RecordingStatus) {
        self.status_tx.send_replace(status);
    }
}
