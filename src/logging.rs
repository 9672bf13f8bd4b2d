//! Operation log setup.
//!
//! Every run appends timestamped INFO/WARN/ERROR lines to a log file. The
//! console only shows warnings and errors unless `--verbose` is given, since
//! regular progress is already reported by [`OutputFormatter`](crate::output::OutputFormatter).

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Default log file name, created in the working directory.
pub const DEFAULT_LOG_FILE: &str = "dirsweep.log";

/// Environment variable overriding the log file filter (e.g. `debug`).
pub const LOG_FILTER_ENV: &str = "DIRSWEEP_LOG";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Cannot open log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: tracing_appender::rolling::InitError,
    },
    #[error("A global logger is already installed")]
    AlreadyInitialized,
}

/// Installs the global subscriber. Keep the returned guard alive until exit
/// so buffered log lines are flushed.
pub fn init_logging(log_file: &Path, verbose: bool) -> Result<WorkerGuard, LoggingError> {
    let directory = match log_file.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let file_name = log_file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string());

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(&directory)
        .map_err(|source| LoggingError::LogFile {
            path: log_file.to_path_buf(),
            source,
        })?;
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let file_filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let console_level = if verbose {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(false)
                .with_filter(file_filter),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_target(false)
                .compact()
                .with_filter(console_level),
        )
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    Ok(guard)
}
