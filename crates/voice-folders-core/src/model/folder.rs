use crate::{FolderId, Recording, RecordingId};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named, ordered group of recordings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    /// Unique id within the collection.
    pub id: FolderId,
    /// Display name as entered by the user.
    pub name: String,
    /// Recordings in insertion order.
    pub recordings: Vec<Recording>,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
}

impl Folder {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            id: FolderId::generate(),
            name: name.into(),
            recordings: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Look up a recording by id.
    pub fn recording(&self, id: &RecordingId) -> Option<&Recording> {
        self.recordings.iter().find(|r| &r.id == id)
    }

    /// Number of recordings in the folder.
    pub fn len(&self) -> usize {
        self.recordings.len()
    }

    /// Whether the folder holds no recordings.
    pub fn is_empty(&self) -> bool {
        self.recordings.is_empty()
    }
}
