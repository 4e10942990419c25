//! Logging initialization.
//!
//! The filter comes from the `BSH_LOG` environment variable using the
//! `tracing_subscriber::EnvFilter` syntax (`BSH_LOG=debug`, `BSH_LOG=bsh=trace`).
//! The default is `warn` so that an interactive session stays quiet.
//!
//! Logs go to standard error unless a log file is given. The writer is
//! synchronous: a background writer thread could receive `SIGCHLD` and let the
//! reaper collect a foreground child before the launcher waits for it.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable holding the log filter.
pub const LOG_ENV: &str = "BSH_LOG";

const DEFAULT_FILTER: &str = "warn";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber.
pub fn init(log_file: Option<&Path>) -> Result<()> {
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("cannot open log file {}", path.display()))?;
            let file_layer = fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true)
                .with_line_number(true);
            tracing_subscriber::registry()
                .with(env_filter())
                .with(file_layer)
                .try_init()?;
        }
        None => {
            let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);
            tracing_subscriber::registry()
                .with(env_filter())
                .with(stderr_layer)
                .try_init()?;
        }
    }
    tracing::debug!(log_file = ?log_file, "logging initialized");
    Ok(())
}
