use crate::{RecordingId, ResourceHandle};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A committed (or staged, not yet committed) audio recording.
///
/// Once a recording is appended to a folder it is never modified; only a
/// staged draft may be renamed before commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    /// Unique id within the owning folder.
    pub id: RecordingId,
    /// Display name chosen by the user (not unique).
    pub name: String,
    /// Where the captured audio lives.
    pub uri: ResourceHandle,
    /// Length of the capture in whole seconds.
    pub duration: u64,
    /// When the capture was finalized.
    pub created_at: DateTime<Utc>,
}

impl Recording {
    /// Build a draft for a freshly finalized capture.
    pub fn draft(name: impl Into<String>, uri: ResourceHandle, duration: u64) -> Self {
        Self {
            id: RecordingId::generate(),
            name: name.into(),
            uri,
            duration,
            created_at: Utc::now(),
        }
    }

    /// Default name for the next recording in a folder holding `existing`.
    ///
    /// Names are not identifiers, so two recordings may end up sharing one.
    pub fn default_name(existing: usize) -> String {
        format!("Recording {}", existing + 1)
    }
}
