use crate::adapter::{AdapterFuture, ResourceHandle};

use serde::{Deserialize, Serialize};

/// Outcome of asking the platform for microphone access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    /// Capture may proceed.
    Granted,
    /// Capture must not be attempted.
    Denied,
}

/// Encoding quality requested when a capture starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityPreset {
    /// Device sample rate, 32-bit float samples.
    #[default]
    High,
    /// 16 kHz, 16-bit integer samples.
    Low,
}

/// Token for an in-progress capture issued by [`AudioCaptureAdapter::start`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CaptureHandle(pub u64);

/// A finalized capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedAudio {
    /// Where the captured audio was stored.
    pub resource: ResourceHandle,
    /// Length of the capture in whole seconds.
    pub duration_secs: u64,
}

/// Platform microphone capture.
///
/// The device is a singleton: implementations may assume at most one capture
/// is active at a time (callers enforce this).
pub trait AudioCaptureAdapter: Send + Sync {
    /// Ask the platform for microphone access.
    fn request_permission(&self) -> AdapterFuture<'_, PermissionStatus>;

    /// Open the device and begin capturing.
    fn start(&self, preset: QualityPreset) -> AdapterFuture<'_, CaptureHandle>;

    /// Stop capturing, release the device and persist what was captured.
    ///
    /// The device must be released even when finalizing fails.
    fn stop(&self, handle: CaptureHandle) -> AdapterFuture<'_, CapturedAudio>;
}
