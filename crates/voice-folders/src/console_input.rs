//! Line-oriented console front-end.
//!
//! Reads stdin on a blocking task, parses each line into an [`AppCommand`]
//! and forwards it to the application. Parse errors are reported to the
//! console view, never to the application.

use crate::{AppCommand, AppError, AppResult, Notice};

use std::{panic::Location, time::Duration};

use error_location::ErrorLocation;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

/// Forwards typed commands to the application.
pub struct ConsoleInput {
    command_tx: mpsc::Sender<AppCommand>,
    notice_tx: mpsc::Sender<Notice>,
}

impl ConsoleInput {
    /// Create an input forwarding to `command_tx`, reporting typos on `notice_tx`.
    pub fn new(command_tx: mpsc::Sender<AppCommand>, notice_tx: mpsc::Sender<Notice>) -> Self {
        Self {
            command_tx,
            notice_tx,
        }
    }

    /// Run until shutdown is signalled or stdin closes.
    ///
    /// End of input is treated as a request to quit.
    #[instrument(skip_all)]
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) -> AppResult<()> {
        let (line_tx, mut line_rx) = mpsc::channel::<String>(32);

        // Single persistent blocking task reading stdin.
        //
        // Shutdown: when line_rx is dropped (loop breaks), the next
        // line_tx.blocking_send() fails, breaking the blocking loop.
        let handle = tokio::task::spawn_blocking(move || {
            for line in std::io::stdin().lines() {
                match line {
                    Ok(line) => {
                        if line_tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = ?e, "Failed to read console input");
                        break;
                    }
                }
            }
        });

        loop {
            tokio::select! {
                _ = shutdown_rx.changed() => {
                    info!("Console input shutting down");
                    break;
                }
                line = line_rx.recv() => {
                    match line {
                        Some(line) => {
                            if !self.handle_line(&line).await? {
                                break;
                            }
                        }
                        None => {
                            info!("Console input closed, requesting shutdown");
                            self.send(AppCommand::Shutdown).await?;
                            break;
                        }
                    }
                }
            }
        }

        drop(line_rx);

        // Best-effort join: the blocking task may be stuck in a read until
        // the next line arrives. It is cleaned up on process exit regardless.
        match tokio::time::timeout(Duration::from_secs(1), handle).await {
            Ok(Ok(())) => debug!("Console reader stopped cleanly"),
            Ok(Err(e)) => warn!(error = ?e, "Console reader task panicked"),
            Err(_) => debug!("Console reader still blocked on stdin, will be cleaned up on exit"),
        }

        Ok(())
    }

    /// Returns `false` once a shutdown command has been forwarded.
    async fn handle_line(&self, line: &str) -> AppResult<bool> {
        match parse_command(line) {
            Ok(None) => Ok(true),
            Ok(Some(command)) => {
                let keep_going = command != AppCommand::Shutdown;
                debug!(?command, "Console command parsed");
                self.send(command).await?;
                Ok(keep_going)
            }
            Err(e) => {
                debug!(error = ?e, "Rejected console input");
                if self.notice_tx.send(Notice::Error(e.user_message())).await.is_err() {
                    warn!("Console view is gone, dropping input error");
                }
                Ok(true)
            }
        }
    }

    async fn send(&self, command: AppCommand) -> AppResult<()> {
        self.command_tx
            .send(command)
            .await
            .map_err(|e| AppError::ChannelSendFailed {
                message: e.to_string(),
                location: ErrorLocation::from(Location::caller()),
            })
    }
}

/// Parse one console line. Blank lines yield `None`.
///
/// The first word selects the command; the rest of the line is its
/// argument. Names are kept exactly as typed after the separating space.
#[track_caller]
pub(crate) fn parse_command(line: &str) -> AppResult<Option<AppCommand>> {
    let line = line.trim_start();
    if line.trim().is_empty() {
        return Ok(None);
    }

    let (keyword, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let target = rest.trim();

    let command = match keyword.to_lowercase().as_str() {
        "list" | "ls" => AppCommand::ListFolders {
            query: target.to_string(),
        },
        "new" | "mkdir" => {
            if rest.is_empty() {
                return Err(usage(line, "new <folder name>"));
            }
            AppCommand::CreateFolder {
                name: rest.to_string(),
            }
        }
        "open" | "cd" => {
            if target.is_empty() {
                return Err(usage(line, "open <folder id or name>"));
            }
            AppCommand::OpenFolder {
                target: target.to_string(),
            }
        }
        "close" | "back" => AppCommand::CloseFolder,
        "record" | "rec" => AppCommand::StartRecording,
        "done" | "finish" => AppCommand::StopRecording,
        "rename" => AppCommand::RenameStaged {
            name: rest.to_string(),
        },
        "preview" => AppCommand::TogglePreview,
        "save" => AppCommand::SaveStaged,
        "discard" => AppCommand::DiscardStaged,
        "play" => {
            if target.is_empty() {
                return Err(usage(line, "play <recording id or name>"));
            }
            AppCommand::PlayRecording {
                target: target.to_string(),
            }
        }
        "toggle" => {
            if target.is_empty() {
                return Err(usage(line, "toggle <recording id or name>"));
            }
            AppCommand::ToggleRecording {
                target: target.to_string(),
            }
        }
        "pause" | "halt" => AppCommand::StopPlayback,
        "help" | "?" => AppCommand::Help,
        "quit" | "exit" | "q" => AppCommand::Shutdown,
        _ => {
            return Err(AppError::InvalidCommand {
                input: line.to_string(),
                reason: format!("Unknown command \"{}\". Type `help` for a list.", keyword),
                location: ErrorLocation::from(Location::caller()),
            });
        }
    };

    Ok(Some(command))
}

#[track_caller]
fn usage(line: &str, form: &str) -> AppError {
    AppError::InvalidCommand {
        input: line.to_string(),
        reason: format!("Usage: {}", form),
        location: ErrorLocation::from(Location::caller()),
    }
}
