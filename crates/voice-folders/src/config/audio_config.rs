use voice_folders_core::QualityPreset;

use serde::{Deserialize, Serialize};

/// Capture encoding configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfig {
    /// `high` keeps the device rate as float WAV, `low` writes 16kHz 16-bit.
    #[serde(default)]
    pub quality: QualityPreset,
}
