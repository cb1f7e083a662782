use crate::console_view::{
    HELP, Notice, format_duration, render_notice, render_playback, render_recording,
};

use voice_folders_core::{
    Folder, FolderId, PlaybackState, PlaybackStatus, Recording, RecordingStatus, ResourceHandle,
};

use chrono::{TimeZone, Utc};
use uuid::Uuid;

fn folder(name: &str, recordings: Vec<Recording>) -> Folder {
    Folder {
        id: FolderId::from("1700000000000"),
        name: name.to_string(),
        recordings,
        created_at: Utc::now(),
    }
}

/// WHAT: Durations render as minutes and zero-padded seconds
/// WHY: Matches the duration shown next to every recording
#[test]
fn given_seconds_when_formatting_then_minutes_and_padded_seconds() {
    assert_eq!(format_duration(0), "0:00");
    assert_eq!(format_duration(7), "0:07");
    assert_eq!(format_duration(65), "1:05");
    assert_eq!(format_duration(600), "10:00");
}

/// WHAT: A staged draft shows its name, duration and any failed save
/// WHY: The user must see that the capture is kept after a storage failure
#[test]
fn given_staged_with_error_when_rendering_then_error_shown() {
    // Given: A staged draft whose last save failed
    let status = RecordingStatus::Staged {
        session_id: Uuid::new_v4(),
        folder_id: FolderId::from("1"),
        draft: Recording::draft("Idea 1", ResourceHandle::new("file:///a.wav"), 65),
        last_error: Some("disk full".to_string()),
    };

    // When: Rendering
    let text = render_recording(&status);

    // Then: Name, duration and error present
    assert!(text.contains("\"Idea 1\""));
    assert!(text.contains("1:05"));
    assert!(text.contains("Last save failed: disk full"));
}

/// WHAT: A capture shows the wall-clock time it started
/// WHY: The console has no live timer
#[test]
#[allow(clippy::unwrap_used)]
fn given_capturing_when_rendering_then_start_time_shown() {
    // Given: A capture started at a fixed time
    let status = RecordingStatus::Capturing {
        session_id: Uuid::new_v4(),
        folder_id: FolderId::from("1"),
        started_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 15).unwrap(),
    };

    // When/Then
    assert!(render_recording(&status).contains("09:30:15"));
}

/// WHAT: Loading is silent while playing and stopped are announced
/// WHY: Loading is transient and would only add noise
#[test]
fn given_playback_states_when_rendering_then_loading_silent() {
    // Given: One resource in each state
    let resource = Some(ResourceHandle::new("file:///a.wav"));
    let status = |state: PlaybackState| PlaybackStatus {
        state,
        resource: resource.clone(),
    };

    // When/Then
    assert_eq!(render_playback("Preview", &status(PlaybackState::Loading)), None);
    assert_eq!(
        render_playback("Preview", &status(PlaybackState::Playing)).as_deref(),
        Some("Preview: playing file:///a.wav")
    );
    assert_eq!(
        render_playback("Playback", &status(PlaybackState::Stopped)).as_deref(),
        Some("Playback: stopped")
    );
}

/// WHAT: Folder notices list folders and recordings, with empty-state text
/// WHY: Empty lists must still tell the user what to do
#[test]
fn given_folder_notices_when_rendering_then_rows_or_empty_text() {
    // Given: An empty listing, an empty folder and a folder with a recording
    let empty_folder = folder("Ideas", Vec::new());
    let full_folder = folder(
        "Songs",
        vec![Recording::draft("Chorus", ResourceHandle::new("file:///c.wav"), 42)],
    );

    // When: Rendering
    let none = render_notice(&Notice::Folders(Vec::new()));
    let listing = render_notice(&Notice::Folders(vec![empty_folder.clone(), full_folder.clone()]));
    let opened_empty = render_notice(&Notice::FolderOpened(empty_folder));
    let opened_full = render_notice(&Notice::FolderOpened(full_folder));

    // Then
    assert_eq!(none, "No folders.");
    assert_eq!(listing.lines().count(), 2);
    assert!(listing.contains("Songs  (1 recordings)"));
    assert!(opened_empty.contains("No recordings yet"));
    assert!(opened_full.contains("Chorus  0:42"));
}

/// WHAT: Help and error notices render their text
/// WHY: Errors must be visible without reading logs
#[test]
fn given_help_and_error_when_rendering_then_text_shown() {
    assert_eq!(render_notice(&Notice::Help), HELP);
    assert_eq!(
        render_notice(&Notice::Error("Folder name cannot be empty.".to_string())),
        "Error: Folder name cannot be empty."
    );
}
