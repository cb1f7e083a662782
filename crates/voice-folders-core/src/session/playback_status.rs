use crate::ResourceHandle;

/// Where a [`PlaybackSession`](crate::PlaybackSession) is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing is audible. A resource may still be loaded.
    Stopped,
    /// A resource is being decoded.
    Loading,
    /// Output is running.
    Playing,
}

/// Snapshot published to observers on every playback transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackStatus {
    /// Current state.
    pub state: PlaybackState,
    /// Resource loaded (or being loaded), if any.
    pub resource: Option<ResourceHandle>,
}

impl PlaybackStatus {
    pub(crate) fn stopped() -> Self {
        Self {
            state: PlaybackState::Stopped,
            resource: None,
        }
    }

    /// Whether `resource` is the one currently playing.
    pub fn is_playing(&self, resource: &ResourceHandle) -> bool {
        self.state == PlaybackState::Playing && self.resource.as_ref() == Some(resource)
    }
}

/// Discrete notifications from a playback session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    /// The media reached its end on its own. Sent once per playback.
    Completed {
        /// Resource that finished.
        resource: ResourceHandle,
    },
}
