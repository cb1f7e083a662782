use error_location::ErrorLocation;
use thiserror::Error;

/// Errors surfaced by the recording, playback and persistence layers.
///
/// Every variant records the source location where it was created so a log
/// line can be traced back to the failing call.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The user (or platform) refused microphone access.
    #[error("Microphone permission denied {location}")]
    PermissionDenied {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The capture or playback device could not be opened.
    #[error("Audio device unavailable: {reason} {location}")]
    DeviceUnavailable {
        /// Description of the device failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Permission grant or device start did not resolve in time.
    #[error("Capture start timed out after {timeout_ms}ms {location}")]
    CaptureStartTimeout {
        /// Configured bound that elapsed.
        timeout_ms: u64,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The capture device is already held by a session.
    #[error("A capture session is already active {location}")]
    SessionBusy {
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The requested operation is not valid in the session's current state.
    #[error("Cannot {action} while {state} {location}")]
    InvalidTransition {
        /// Operation that was attempted.
        action: &'static str,
        /// State the session was in.
        state: &'static str,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Stopping the capture failed to produce a usable resource.
    #[error("Failed to finalize capture: {reason} {location}")]
    CaptureFinalizeError {
        /// Description of the finalize failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// A resource could not be loaded for playback.
    #[error("Failed to load {resource} for playback: {reason} {location}")]
    PlaybackLoadError {
        /// Resource handle that failed to load.
        resource: String,
        /// Description of the load failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Play, stop or unload failed on an already loaded resource.
    #[error("Playback error: {reason} {location}")]
    PlaybackError {
        /// Description of the playback failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The persistence backend could not be reached or read.
    #[error("Storage unavailable: {reason} {location}")]
    StorageUnavailable {
        /// Description of the storage failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Writing the collection to the persistence backend failed.
    #[error("Storage write failed: {reason} {location}")]
    StorageWriteError {
        /// Description of the write failure.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The persisted collection exists but cannot be used.
    #[error("Stored collection is invalid: {reason} {location}")]
    CorruptCollection {
        /// Description of what is wrong with the stored data.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// No folder with the given id exists in the collection.
    #[error("Folder not found: {folder_id} {location}")]
    FolderNotFound {
        /// Id that was looked up.
        folder_id: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// Input was rejected before any mutation took place.
    #[error("Validation failed: {reason} {location}")]
    ValidationError {
        /// Description of the rejected input.
        reason: String,
        /// Source location where error occurred.
        location: ErrorLocation,
    },

    /// The repository task has stopped and no longer accepts requests.
    #[error("Folder repository is closed {location}")]
    RepositoryClosed {
        /// Source location where error occurred.
        location: ErrorLocation,
    },
}

impl CoreError {
    /// Short message suitable for showing to the user.
    ///
    /// Unlike `Display`, this omits source locations and internal details.
    pub fn user_message(&self) -> String {
        match self {
            CoreError::PermissionDenied { .. } => {
                "Microphone access was denied. Allow it in system settings to record.".to_string()
            }
            CoreError::DeviceUnavailable { .. } => "No usable audio device was found.".to_string(),
            CoreError::CaptureStartTimeout { .. } => {
                "The microphone did not start in time. Try again.".to_string()
            }
            CoreError::SessionBusy { .. } => "A recording is already in progress.".to_string(),
            CoreError::InvalidTransition { action, state, .. } => {
                format!("Cannot {action} while {state}.")
            }
            CoreError::CaptureFinalizeError { .. } => {
                "The recording could not be finished.".to_string()
            }
            CoreError::PlaybackLoadError { .. } => "The recording could not be opened.".to_string(),
            CoreError::PlaybackError { .. } => "Playback failed.".to_string(),
            CoreError::StorageUnavailable { .. } => "Saved folders could not be read.".to_string(),
            CoreError::StorageWriteError { .. } => {
                "Changes could not be saved. Your recording is kept; try saving again.".to_string()
            }
            CoreError::CorruptCollection { .. } => "Saved folders are damaged.".to_string(),
            CoreError::FolderNotFound { .. } => "That folder no longer exists.".to_string(),
            CoreError::ValidationError { reason, .. } => reason.clone(),
            CoreError::RepositoryClosed { .. } => "The folder library has shut down.".to_string(),
        }
    }
}

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;
