//! Tracing setup
//!
//! The TUI owns the terminal, so logs go to a daily rolling JSON file.

use std::io;
use std::path::Path;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const LOG_FILE_PREFIX: &str = "scanwise.log";

/// Install the global subscriber. Keep the returned guard alive until exit so
/// buffered lines get flushed.
pub fn init_tracing(
    log_dir: &Path,
    log_to_stderr: bool,
) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_target(false)
        .json();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);

    if log_to_stderr {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_target(false);
        registry.with(stderr_layer).try_init()?;
    } else {
        registry.try_init()?;
    }

    install_panic_hook();
    Ok(file_guard)
}

/// Send panic messages to the log instead of the terminal. Render panics are
/// caught and drawn inline, so printing them would corrupt the screen.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        tracing::error!(panic = %info, "panic");
    }));
}
