use crate::{AdapterError, AudioCaptureAdapter, CaptureHandle, CapturedAudio, CoreError, CoreResult};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::{error, info, warn};
use uuid::Uuid;

/// The microphone, shared by every [`RecordingSession`](crate::RecordingSession).
///
/// Holds a single permit: whichever session is capturing owns it until the
/// adapter has been told to stop, so a second session cannot start a capture
/// on top of the first.
#[derive(Clone)]
pub struct CaptureDevice {
    adapter: Arc<dyn AudioCaptureAdapter>,
    gate: Arc<Semaphore>,
}

impl CaptureDevice {
    /// Wrap the platform capture adapter.
    pub fn new(adapter: Arc<dyn AudioCaptureAdapter>) -> Self {
        Self {
            adapter,
            gate: Arc::new(Semaphore::new(1)),
        }
    }

    /// Whether some session currently holds the device.
    pub fn is_busy(&self) -> bool {
        self.gate.available_permits() == 0
    }

    pub(crate) fn adapter(&self) -> Arc<dyn AudioCaptureAdapter> {
        Arc::clone(&self.adapter)
    }

    #[track_caller]
    pub(crate) fn try_acquire(&self) -> CoreResult<OwnedSemaphorePermit> {
        Arc::clone(&self.gate)
            .try_acquire_owned()
            .map_err(|_| CoreError::SessionBusy {
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

/// Scoped ownership of a running capture.
///
/// [`CaptureGuard::finish`] stops the adapter and then releases the device.
/// If the guard is dropped without finishing (session torn down, task
/// cancelled), the adapter is still stopped on a background task and the
/// device is released only after that stop completes.
pub(crate) struct CaptureGuard {
    adapter: Arc<dyn AudioCaptureAdapter>,
    handle: Option<CaptureHandle>,
    permit: Option<OwnedSemaphorePermit>,
    session_id: Uuid,
}

impl CaptureGuard {
    pub(crate) fn new(
        adapter: Arc<dyn AudioCaptureAdapter>,
        handle: CaptureHandle,
        permit: OwnedSemaphorePermit,
        session_id: Uuid,
    ) -> Self {
        Self {
            adapter,
            handle: Some(handle),
            permit: Some(permit),
            session_id,
        }
    }

    /// Stop the capture. The device is released when this returns, whether
    /// or not finalizing succeeded.
    pub(crate) async fn finish(mut self) -> Result<CapturedAudio, AdapterError> {
        let Some(handle) = self.handle.take() else {
            return Err(AdapterError::Failed("capture already stopped".to_string()));
        };

        self.adapter.stop(handle).await
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        let adapter = Arc::clone(&self.adapter);
        let permit = self.permit.take();
        let session_id = self.session_id;

        warn!(session_id = %session_id, "Capture abandoned, stopping device");

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    match adapter.stop(handle).await {
                        Ok(captured) => info!(
                            session_id = %session_id,
                            resource = %captured.resource,
                            "Abandoned capture stopped, audio discarded"
                        ),
                        Err(e) => error!(
                            session_id = %session_id,
                            error = ?e,
                            "Failed to stop abandoned capture"
                        ),
                    }
                    drop(permit);
                });
            }
            Err(_) => {
                error!(
                    session_id = %session_id,
                    "Capture abandoned outside a runtime, device may remain open"
                );
            }
        }
    }
}
