use crate::adapter::{AdapterError, AdapterFuture, ResourceHandle};

use std::sync::Arc;

/// Invoked by a playback adapter when a loaded resource reaches its end.
///
/// May be called from an audio thread, and once per completed playback.
pub type CompletionCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Token for a loaded resource issued by [`AudioPlaybackAdapter::load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlaybackHandle(pub u64);

/// Platform audio decode and output for one resource per handle.
pub trait AudioPlaybackAdapter: Send + Sync {
    /// Decode `resource` and prepare it for output.
    fn load(&self, resource: &ResourceHandle) -> AdapterFuture<'_, PlaybackHandle>;

    /// Start output. Restarts from the beginning if the media already ended.
    fn play(&self, handle: PlaybackHandle) -> AdapterFuture<'_, ()>;

    /// Halt output and rewind.
    fn stop(&self, handle: PlaybackHandle) -> AdapterFuture<'_, ()>;

    /// Release everything held for `handle`. The handle is invalid afterwards.
    fn unload(&self, handle: PlaybackHandle) -> AdapterFuture<'_, ()>;

    /// Register the end-of-media callback for `handle`, replacing any previous one.
    fn on_completion(
        &self,
        handle: PlaybackHandle,
        callback: CompletionCallback,
    ) -> Result<(), AdapterError>;
}
