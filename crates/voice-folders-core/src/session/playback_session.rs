use crate::{
    AdapterError, AudioPlaybackAdapter, CompletionCallback, CoreError, CoreResult,
    PlaybackEvent, PlaybackHandle, PlaybackState, PlaybackStatus, ResourceHandle,
};

use std::{
    panic::Location,
    sync::{Arc, Mutex, MutexGuard},
};

use error_location::ErrorLocation;
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, instrument, warn};

/// Buffered completion events per subscriber before the oldest are dropped.
const EVENT_CAPACITY: usize = 16;

/// State touched by both the session and the adapter's completion callback.
struct Shared {
    state: PlaybackState,
    resource: Option<ResourceHandle>,
    /// Load generation whose completions are still meaningful.
    active_load: Option<u64>,
}

struct LoadedMedia {
    resource: ResourceHandle,
    handle: PlaybackHandle,
}

/// At-most-one active playback over an [`AudioPlaybackAdapter`].
///
/// Loading a new resource stops and unloads the previous one first, so a
/// session never holds more than one adapter handle. Natural completion
/// moves the session back to `Stopped` without any caller action and is
/// announced once on [`PlaybackSession::events`].
///
/// Methods take `&mut self`, so transitions on one session are strictly
/// sequential.
pub struct PlaybackSession {
    name: &'static str,
    adapter: Arc<dyn AudioPlaybackAdapter>,
    loaded: Option<LoadedMedia>,
    next_load_id: u64,
    shared: Arc<Mutex<Shared>>,
    status_tx: Arc<watch::Sender<PlaybackStatus>>,
    events_tx: broadcast::Sender<PlaybackEvent>,
}

impl PlaybackSession {
    /// Create a stopped session. `name` tags log lines ("library", "preview").
    pub fn new(name: &'static str, adapter: Arc<dyn AudioPlaybackAdapter>) -> Self {
        let (status_tx, _) = watch::channel(PlaybackStatus::stopped());
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            name,
            adapter,
            loaded: None,
            next_load_id: 0,
            shared: Arc::new(Mutex::new(Shared {
                state: PlaybackState::Stopped,
                resource: None,
                active_load: None,
            })),
            status_tx: Arc::new(status_tx),
            events_tx,
        }
    }

    /// Current state.
    pub fn state(&self) -> PlaybackState {
        lock(&self.shared).state
    }

    /// Resource currently loaded, if any.
    pub fn loaded_resource(&self) -> Option<&ResourceHandle> {
        self.loaded.as_ref().map(|m| &m.resource)
    }

    /// Observe every state transition.
    pub fn subscribe(&self) -> watch::Receiver<PlaybackStatus> {
        self.status_tx.subscribe()
    }

    /// Receive completion notifications.
    pub fn events(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events_tx.subscribe()
    }

    /// Load `resource` without starting output.
    ///
    /// A no-op if it is already loaded; otherwise whatever was loaded before
    /// is stopped and unloaded first.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackLoadError` if the adapter cannot load the resource.
    /// The session is left stopped with nothing loaded.
    #[instrument(skip(self), fields(session = self.name))]
    pub async fn load(&mut self, resource: &ResourceHandle) -> CoreResult<()> {
        if self.loaded_resource() == Some(resource) {
            return Ok(());
        }

        if let Err(e) = self.release().await {
            warn!(session = self.name, error = ?e, "Previous resource did not unload cleanly");
        }

        self.set_status(PlaybackState::Loading, Some(resource.clone()), None);

        let handle = match self.adapter.load(resource).await {
            Ok(handle) => handle,
            Err(e) => {
                self.set_status(PlaybackState::Stopped, None, None);
                return Err(CoreError::PlaybackLoadError {
                    resource: resource.to_string(),
                    reason: e.to_string(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        self.next_load_id += 1;
        let load_id = self.next_load_id;

        if let Err(e) = self
            .adapter
            .on_completion(handle, self.completion_callback(load_id, resource.clone()))
        {
            if let Err(unload_err) = self.adapter.unload(handle).await {
                warn!(session = self.name, error = ?unload_err, "Unload after failed registration failed");
            }
            self.set_status(PlaybackState::Stopped, None, None);
            return Err(CoreError::PlaybackLoadError {
                resource: resource.to_string(),
                reason: format!("Failed to register completion callback: {}", e),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.loaded = Some(LoadedMedia {
            resource: resource.clone(),
            handle,
        });
        self.set_status(PlaybackState::Stopped, Some(resource.clone()), Some(load_id));

        debug!(session = self.name, resource = %resource, "Resource loaded");

        Ok(())
    }

    /// Play `resource` from the beginning.
    ///
    /// Loads it first if needed (unloading any other resource). If it is
    /// already playing, it restarts.
    ///
    /// # Errors
    ///
    /// `PlaybackLoadError` if loading fails, `PlaybackError` if output
    /// cannot start.
    #[instrument(skip(self), fields(session = self.name))]
    pub async fn play(&mut self, resource: &ResourceHandle) -> CoreResult<()> {
        self.load(resource).await?;

        let Some(handle) = self.loaded.as_ref().map(|m| m.handle) else {
            return Err(CoreError::PlaybackError {
                reason: "Nothing loaded after load".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        if self.state() == PlaybackState::Playing {
            self.stop().await?;
        }

        // Enter Playing before the adapter call: very short media may
        // complete before `play` returns.
        self.set_state(PlaybackState::Playing);

        if let Err(e) = self.adapter.play(handle).await {
            self.set_state(PlaybackState::Stopped);
            return Err(playback_error("start playback", &e));
        }

        info!(session = self.name, resource = %resource, "Playback started");

        Ok(())
    }

    /// Stop `resource` if it is playing, otherwise play it.
    ///
    /// # Errors
    ///
    /// See [`PlaybackSession::play`] and [`PlaybackSession::stop`].
    pub async fn toggle(&mut self, resource: &ResourceHandle) -> CoreResult<()> {
        if self.status_tx.borrow().is_playing(resource) {
            self.stop().await
        } else {
            self.play(resource).await
        }
    }

    /// Halt output. Idempotent when already stopped; the resource stays
    /// loaded.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError` if the adapter fails to stop. The session is
    /// considered stopped either way.
    #[instrument(skip(self), fields(session = self.name))]
    pub async fn stop(&mut self) -> CoreResult<()> {
        if self.state() == PlaybackState::Stopped {
            return Ok(());
        }

        self.set_state(PlaybackState::Stopped);

        if let Some(handle) = self.loaded.as_ref().map(|m| m.handle) {
            self.adapter
                .stop(handle)
                .await
                .map_err(|e| playback_error("stop playback", &e))?;
        }

        debug!(session = self.name, "Playback stopped");

        Ok(())
    }

    /// Stop and unload whatever is loaded.
    ///
    /// The session forgets the handle even if the adapter reports an error,
    /// so it can never be used again through this session.
    ///
    /// # Errors
    ///
    /// Returns `PlaybackError` if the adapter fails to unload.
    #[instrument(skip(self), fields(session = self.name))]
    pub async fn release(&mut self) -> CoreResult<()> {
        let was_playing = self.state() != PlaybackState::Stopped;
        self.set_status(PlaybackState::Stopped, None, None);

        let Some(media) = self.loaded.take() else {
            return Ok(());
        };

        if was_playing && let Err(e) = self.adapter.stop(media.handle).await {
            warn!(session = self.name, error = ?e, "Stop before unload failed");
        }

        self.adapter
            .unload(media.handle)
            .await
            .map_err(|e| playback_error("unload", &e))?;

        debug!(session = self.name, resource = %media.resource, "Resource released");

        Ok(())
    }

    fn completion_callback(&self, load_id: u64, resource: ResourceHandle) -> CompletionCallback {
        let name = self.name;
        let shared = Arc::clone(&self.shared);
        let status_tx = Arc::clone(&self.status_tx);
        let events_tx = self.events_tx.clone();

        Arc::new(move || {
            {
                let mut shared = lock(&shared);
                if shared.state != PlaybackState::Playing || shared.active_load != Some(load_id) {
                    debug!(session = name, "Ignoring stale completion signal");
                    return;
                }
                shared.state = PlaybackState::Stopped;
                status_tx.send_replace(PlaybackStatus {
                    state: PlaybackState::Stopped,
                    resource: shared.resource.clone(),
                });
            }

            let _ = events_tx.send(PlaybackEvent::Completed {
                resource: resource.clone(),
            });

            info!(session = name, resource = %resource, "Playback completed");
        })
    }

    fn set_state(&self, state: PlaybackState) {
        let mut shared = lock(&self.shared);
        shared.state = state;
        self.status_tx.send_replace(PlaybackStatus {
            state,
            resource: shared.resource.clone(),
        });
    }

    fn set_status(
        &self,
        state: PlaybackState,
        resource: Option<ResourceHandle>,
        active_load: Option<u64>,
    ) {
        let mut shared = lock(&self.shared);
        shared.state = state;
        shared.resource = resource.clone();
        shared.active_load = active_load;
        self.status_tx
            .send_replace(PlaybackStatus { state, resource });
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        let Some(media) = self.loaded.take() else {
            return;
        };

        let adapter = Arc::clone(&self.adapter);
        let name = self.name;

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(async move {
                    if let Err(e) = adapter.stop(media.handle).await {
                        debug!(session = name, error = ?e, "Stop on drop failed");
                    }
                    if let Err(e) = adapter.unload(media.handle).await {
                        warn!(session = name, error = ?e, "Unload on drop failed");
                    }
                });
            }
            Err(_) => {
                error!(
                    session = name,
                    resource = %media.resource,
                    "Playback session dropped outside a runtime, resource not unloaded"
                );
            }
        }
    }
}

/// Recover from lock poison; the guarded data is plain state and stays valid.
fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|e| {
        error!("Playback state lock poisoned, recovering: {}", e);
        e.into_inner()
    })
}

#[track_caller]
fn playback_error(action: &str, source: &AdapterError) -> CoreError {
    CoreError::PlaybackError {
        reason: format!("Failed to {}: {}", action, source),
        location: ErrorLocation::from(Location::caller()),
    }
}
