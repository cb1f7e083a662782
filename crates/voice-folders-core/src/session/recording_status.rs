use crate::{FolderId, Recording};

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Snapshot of a [`RecordingSession`](crate::RecordingSession) published to
/// observers on every transition.
///
/// Committed and discarded captures collapse straight back to `Idle`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingStatus {
    /// Ready to start a capture.
    Idle,
    /// Waiting for permission and the device to open.
    Starting {
        /// Correlates log lines of this capture.
        session_id: Uuid,
        /// Folder the capture will be saved into.
        folder_id: FolderId,
    },
    /// Audio is being captured.
    Capturing {
        /// Correlates log lines of this capture.
        session_id: Uuid,
        /// Folder the capture will be saved into.
        folder_id: FolderId,
        /// When the device started.
        started_at: DateTime<Utc>,
    },
    /// The device is being stopped and the capture written out.
    Finalizing {
        /// Correlates log lines of this capture.
        session_id: Uuid,
    },
    /// A capture awaits rename, preview, commit or discard.
    Staged {
        /// Correlates log lines of this capture.
        session_id: Uuid,
        /// Folder the capture will be saved into.
        folder_id: FolderId,
        /// The draft as it would be committed now.
        draft: Recording,
        /// Why the last commit attempt failed, if it did.
        last_error: Option<String>,
    },
}

impl RecordingStatus {
    /// Whether the microphone is in use by this session.
    pub fn is_capturing(&self) -> bool {
        matches!(self, RecordingStatus::Capturing { .. })
    }

    /// Whether a draft is waiting for the user.
    pub fn is_staged(&self) -> bool {
        matches!(self, RecordingStatus::Staged { .. })
    }
}
