//! Interfaces to the platform audio stack.
//!
//! Microphone capture and audio decode/playback are consumed through these
//! traits so the session state machines never depend on a concrete backend.
//! The cpal-based implementations live in [`crate::audio`].

mod capture;
mod playback;

pub use {
    capture::{AudioCaptureAdapter, CaptureHandle, CapturedAudio, PermissionStatus, QualityPreset},
    playback::{AudioPlaybackAdapter, CompletionCallback, PlaybackHandle},
};

use std::{fmt, future::Future, pin::Pin};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures reported by an audio adapter.
///
/// Sessions translate these into [`CoreError`](crate::CoreError) at their
/// boundary; they never reach UI code directly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// Platform refused access to the device.
    #[error("permission denied")]
    PermissionDenied,

    /// No device, or the device could not be opened.
    #[error("device not available: {0}")]
    DeviceNotAvailable(String),

    /// The operation itself failed.
    #[error("operation failed: {0}")]
    Failed(String),

    /// The handle was never issued or has been released.
    #[error("unknown handle: {0}")]
    UnknownHandle(u64),
}

/// Boxed future returned by adapter operations.
pub type AdapterFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AdapterError>> + Send + 'a>>;

/// Opaque reference to a stored audio blob (a file path or URI).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceHandle(String);

impl ResourceHandle {
    /// Wrap a URI or path.
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    /// The underlying URI.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
