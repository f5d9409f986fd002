// SPDX-License-Identifier: MIT

//! Ambient diagnostic logging for the whole process (`tracing` spans around
//! catalyst dispatch and ledger mutations), distinct from the in-store
//! [`crate::LoggerCollector`] application log. Grounded in the sibling
//! daemon crate's `setup_logging` (`tracing_subscriber::registry()` +
//! `EnvFilter` + a non-blocking file appender via `tracing-appender`).

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs a process-wide `tracing` subscriber that writes to `log_path`,
/// filtered by `RUST_LOG` (falling back to `"info"`). The returned
/// [`WorkerGuard`] must be held for the lifetime of the process — dropping
/// it flushes and stops the non-blocking writer, which happens automatically
/// when a caller lets it fall out of scope at shutdown.
pub fn init_file_logging(log_path: &Path) -> std::io::Result<WorkerGuard> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file_name = log_path.file_name().unwrap_or_else(|| log_path.as_os_str());
    let dir = log_path.parent().unwrap_or_else(|| Path::new("."));
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .try_init();

    Ok(guard)
}

/// Installs a process-wide `tracing` subscriber that writes to stderr,
/// filtered by `RUST_LOG` (falling back to `"info"`) — the simpler path for
/// a CLI run that doesn't need a persistent log file.
pub fn init_stderr_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry().with(filter).with(fmt::layer().with_writer(std::io::stderr)).try_init();
}
