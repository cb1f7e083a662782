//! Tracing subscriber setup: readable lines on stderr plus JSON lines in a
//! daily-rolling file.
//!
//! Stderr shares the terminal with the console UI and defaults to warnings;
//! the file defaults to debug.

use crate::AppResult;

use std::{fs, path::Path};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Stderr filter used when `RUST_LOG` is unset.
pub(crate) const CONSOLE_FILTER: &str = "voice_folders=warn,voice_folders_core=warn";

/// Log file filter used when `RUST_LOG` is unset.
pub(crate) const FILE_FILTER: &str = "voice_folders=debug,voice_folders_core=debug";

const LOG_FILE_PREFIX: &str = "voice-folders.log";

/// Stderr and file filters. `rust_log`, when set, applies to both.
pub(crate) fn filters(rust_log: Option<&str>) -> (EnvFilter, EnvFilter) {
    match rust_log {
        Some(directives) => (EnvFilter::new(directives), EnvFilter::new(directives)),
        None => (EnvFilter::new(CONSOLE_FILTER), EnvFilter::new(FILE_FILTER)),
    }
}

fn rust_log() -> Option<String> {
    std::env::var(EnvFilter::DEFAULT_ENV).ok()
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop and must be held
/// until the process exits.
pub(crate) fn init(log_dir: &Path) -> AppResult<WorkerGuard> {
    fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let (console_filter, file_filter) = filters(rust_log().as_deref());

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .with(
            fmt::layer()
                .json()
                .with_writer(file_writer)
                .with_filter(file_filter),
        )
        .init();

    Ok(guard)
}

/// Stderr-only logging for when the log directory cannot be used.
pub(crate) fn init_stderr_only() {
    let (console_filter, _) = filters(rust_log().as_deref());

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(console_filter),
        )
        .init();
}
