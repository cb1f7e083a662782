//! Voice Folders: voice memos organized into named folders, driven from the
//! console.

mod app;
mod app_command;
mod config;
mod console_input;
mod console_view;
mod error;
mod logging;
#[cfg(test)]
mod tests;

pub(crate) use {
    app::App,
    app_command::AppCommand,
    console_input::ConsoleInput,
    console_view::{ConsoleView, Notice},
    error::{AppError, Result as AppResult},
};

use crate::config::Config;

use voice_folders_core::{
    CaptureDevice, CollectionStore, CpalCaptureAdapter, CpalPlaybackAdapter, FolderRepository,
    LibraryView, PlaybackSession, RecordingSession, open_store,
};

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{error, info};

/// Application entry point.
#[tokio::main]
async fn main() {
    // Held until exit so buffered log lines are flushed.
    let log_guard = match Config::log_dir().and_then(|dir| logging::init(&dir)) {
        Ok(guard) => Some(guard),
        Err(e) => {
            logging::init_stderr_only();
            error!(error = ?e, "File logging unavailable, logging to stderr only");
            None
        }
    };

    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {:?}", e);
            std::process::exit(1);
        }
    };

    let (command_tx, command_rx) = mpsc::channel(32);
    let (notice_tx, notice_rx) = mpsc::channel(32);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let channels = Channels {
        command_rx,
        notice_tx: notice_tx.clone(),
        notice_rx,
        shutdown_tx,
    };

    let (app, view) = match build(&config, channels).await {
        Ok(parts) => parts,
        Err(e) => {
            error!("Failed to start: {:?}", e);
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
    };

    let input = ConsoleInput::new(command_tx, notice_tx);

    tokio::join!(
        async {
            if let Err(e) = app.run().await {
                error!(error = ?e, "App error");
            }
        },
        async {
            if let Err(e) = input.run(shutdown_rx.clone()).await {
                error!(error = ?e, "Console input error");
            }
        },
        view.run(shutdown_rx.clone())
    );

    // The stdin reader may still be parked in a blocking read, which would
    // hold up runtime shutdown indefinitely.
    drop(log_guard);
    std::process::exit(0);
}

/// Channel ends handed to the app and the view.
struct Channels {
    command_rx: mpsc::Receiver<AppCommand>,
    notice_tx: mpsc::Sender<Notice>,
    notice_rx: mpsc::Receiver<Notice>,
    shutdown_tx: watch::Sender<bool>,
}

/// Wire storage, adapters and sessions together from `config`.
async fn build(config: &Config, channels: Channels) -> AppResult<(App, ConsoleView)> {
    let Channels {
        command_rx,
        notice_tx,
        notice_rx,
        shutdown_tx,
    } = channels;

    let data_dir = config.data_dir()?;
    let store = open_store(config.storage.profile, &data_dir)?;
    let repository = FolderRepository::load(CollectionStore::new(store))
        .await?
        .spawn();

    info!(
        data_dir = ?data_dir,
        profile = ?config.storage.profile,
        folder_count = repository.snapshot().len(),
        "Folder collection loaded"
    );

    let capture = Arc::new(CpalCaptureAdapter::new(config.recordings_dir()?));
    let playback = Arc::new(CpalPlaybackAdapter::new());

    let device = CaptureDevice::new(capture);
    let preview = PlaybackSession::new("preview", playback.clone());
    let recording = RecordingSession::new(
        device,
        repository.clone(),
        preview,
        config.session_settings(),
    );
    let library = LibraryView::new(repository.clone(), playback);

    let view = ConsoleView {
        recording_rx: recording.subscribe(),
        preview_rx: recording.preview().subscribe(),
        library_rx: library.playback().subscribe(),
        library_events: library.playback().events(),
        notice_rx,
    };

    let app = App {
        repository,
        recording,
        library,
        command_rx,
        notice_tx,
        shutdown_tx,
    };

    Ok((app, view))
}
