//! Tracing subscriber setup.

use crate::error::{PodcastError, Result};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Map a user-facing level name to a filter directive.
///
/// Accepts tracing names as well as the `WARNING` / `CRITICAL` spellings
/// common in other tools, case-insensitively.
pub fn level_directive(level: &str) -> Result<&'static str> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" | "critical" | "fatal" => Ok("error"),
        "off" => Ok("off"),
        other => Err(PodcastError::configuration(
            "logging.level",
            format!("unknown log level '{other}'"),
        )),
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `level`. With `file`, a second
/// plain-text layer appends to it.
pub fn init_logging(level: &str, file: Option<&Path>) -> Result<()> {
    let directive = level_directive(level)?;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    let file_layer = match file {
        Some(path) => {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                std::fs::create_dir_all(parent)?;
            }
            let handle = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(handle)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(file_layer)
        .try_init()
        .map_err(|e| PodcastError::Other(format!("failed to install logger: {e}")))?;

    tracing::debug!(level = directive, log_file = ?file, "Logging initialized");
    Ok(())
}
