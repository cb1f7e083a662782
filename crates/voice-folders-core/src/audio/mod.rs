pub(crate) mod capture;
mod playback;
mod resampler;
pub(crate) mod wav;

pub(crate) use resampler::Resampler;

pub use {capture::CpalCaptureAdapter, playback::CpalPlaybackAdapter};

use crate::AdapterError;

use std::thread::JoinHandle;

/// Join an audio stream thread from async code without stalling the runtime.
pub(crate) async fn join_worker<T: Send + 'static>(
    worker: JoinHandle<T>,
) -> Result<T, AdapterError> {
    let name = worker.thread().name().unwrap_or("audio").to_string();

    tokio::task::spawn_blocking(move || worker.join())
        .await
        .map_err(|e| AdapterError::Failed(format!("Join task for {} failed: {}", name, e)))?
        .map_err(|_| AdapterError::Failed(format!("Thread {} panicked", name)))
}
