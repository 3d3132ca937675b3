//! Log sink setup for the binary.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Parse a `--log-level` value. `warning` is accepted as an alias.
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    let filter = match level.trim().to_ascii_lowercase().as_str() {
        "off" => LevelFilter::OFF,
        "error" => LevelFilter::ERROR,
        "warn" | "warning" => LevelFilter::WARN,
        "info" => LevelFilter::INFO,
        "debug" => LevelFilter::DEBUG,
        "trace" => LevelFilter::TRACE,
        other => bail!(
            "Invalid log level '{}' (expected error, warn, info, debug or trace)",
            other
        ),
    };
    Ok(filter)
}

/// Install the global subscriber: stdout always, plus `log_file` (appended,
/// no ANSI colors) when given.
pub fn init(level: LevelFilter, log_file: Option<&Path>) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = File::options()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(level)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(file_layer)
        .try_init()
        .context("Failed to install log subscriber")?;

    Ok(())
}
