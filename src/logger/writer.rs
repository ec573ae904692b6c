//! Log writer module
//!
//! Installs the global `tracing` subscriber, writing to stderr or to a file.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::BoxError;

/// Build the level filter; `RUST_LOG` takes precedence over `level`
pub fn build_filter(level: &str) -> Result<EnvFilter, BoxError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => parse_level(level),
    }
}

/// Parse a `logging.level` directive string
fn parse_level(level: &str) -> Result<EnvFilter, BoxError> {
    Ok(EnvFilter::try_new(level)?)
}

/// Initialize the global subscriber
///
/// This should be called once at application startup.
/// Returns error if the log file cannot be opened or a subscriber is already set.
pub fn init(level: &str, log_file: Option<&str>) -> Result<(), BoxError> {
    let registry = tracing_subscriber::registry().with(build_filter(level)?);

    match log_file {
        Some(path) => {
            let file = open_log_file(path)?;
            registry
                .with(
                    fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()?;
        }
        None => {
            registry.with(fmt::layer().with_writer(io::stderr)).try_init()?;
        }
    }
    Ok(())
}

/// Open or create a log file for appending
pub fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}
