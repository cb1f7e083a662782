/// Commands sent from the console front-end to the main application.
///
/// Each variant is one user action on a screen of the app; targets are
/// typed by the user and resolved against the current collection by
/// [`App`](crate::App).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Show folders whose name contains `query` (empty = all).
    ListFolders {
        /// Case-insensitive name filter.
        query: String,
    },
    /// Create an empty folder.
    CreateFolder {
        /// Name exactly as typed.
        name: String,
    },
    /// Open a folder by id or name, stopping library playback.
    OpenFolder {
        /// Folder id or name.
        target: String,
    },
    /// Go back to the folder list, stopping library playback.
    CloseFolder,
    /// Start capturing into the open folder.
    StartRecording,
    /// Stop capturing and stage the draft.
    StopRecording,
    /// Rename the staged draft.
    RenameStaged {
        /// New name, any string.
        name: String,
    },
    /// Play or stop the staged draft.
    TogglePreview,
    /// Commit the staged draft to its folder.
    SaveStaged,
    /// Throw the staged draft away.
    DiscardStaged,
    /// Play a recording of the open folder from the start.
    PlayRecording {
        /// Recording id or name.
        target: String,
    },
    /// Play a recording, or stop it if it is the one playing.
    ToggleRecording {
        /// Recording id or name.
        target: String,
    },
    /// Stop library playback.
    StopPlayback,
    /// Print the command reference.
    Help,
    /// Request application shutdown.
    Shutdown,
}
