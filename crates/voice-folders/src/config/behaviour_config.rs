use crate::config::{DEFAULT_CAPTURE_START_TIMEOUT_SECS, default_capture_start_timeout_secs};

use serde::{Deserialize, Serialize};

/// Session behaviour configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviourConfig {
    /// Seconds to wait for microphone permission and device start.
    #[serde(default = "default_capture_start_timeout_secs")]
    pub capture_start_timeout_secs: u64,
}

impl Default for BehaviourConfig {
    fn default() -> Self {
        Self {
            capture_start_timeout_secs: DEFAULT_CAPTURE_START_TIMEOUT_SECS,
        }
    }
}
