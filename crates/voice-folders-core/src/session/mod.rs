mod capture_device;
mod library_view;
mod playback_session;
mod playback_status;
mod recording_session;
mod recording_status;

pub use {
    capture_device::CaptureDevice,
    library_view::LibraryView,
    playback_session::PlaybackSession,
    playback_status::{PlaybackEvent, PlaybackState, PlaybackStatus},
    recording_session::{DEFAULT_START_TIMEOUT, RecordingSession, SessionSettings, StagedRecording},
    recording_status::RecordingStatus,
};
