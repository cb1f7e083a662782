use voice_folders_core::StorageProfile;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Persistence configuration. Read once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// `file` for `folders/folders.json`, `key_value` for the SQLite table.
    #[serde(default)]
    pub profile: StorageProfile,

    /// Where folders and recordings live (None = platform data directory).
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}
