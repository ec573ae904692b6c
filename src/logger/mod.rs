//! Logger module
//!
//! Thin wrappers over `tracing` for the events the server emits:
//! - Server lifecycle logging
//! - Access logging with multiple formats (target `access`)
//! - Command start, output and failure
//! - Error and warning logging

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::{Config, LoggingConfig};
use crate::error::BoxError;
use crate::error::CommandError;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &LoggingConfig) -> Result<(), BoxError> {
    writer::init(&config.level, config.log_file.as_deref())
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    tracing::info!(
        %addr,
        routes = config.routes.len(),
        workers = ?config.server.workers,
        max_body_size = config.http.max_body_size,
        "http-exec listening on http://{addr}"
    );
    for (index, route) in config.routes.iter().enumerate() {
        tracing::info!(
            route = %route.display_name(index),
            command = %route.exec.command,
            pass_thru = route.exec.pass_thru,
            foreground = route.exec.foreground,
            "exec route mounted"
        );
    }
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    tracing::debug!(%peer_addr, "connection accepted");
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    tracing::error!(error = ?err, "failed to serve connection");
}

pub fn log_error(message: &str) {
    tracing::error!("{message}");
}

pub fn log_warning(message: &str) {
    tracing::warn!("{message}");
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    tracing::info!(target: "access", "{}", entry.format(format));
}

pub fn log_command_started(command: &str, argv: &[String], pid: Option<u32>) {
    tracing::info!(command, ?argv, pid, "command started");
}

/// Log captured stdout/stderr, one event per non-empty line
pub fn log_command_output(command: &str, stream: &str, output: &[u8]) {
    let text = String::from_utf8_lossy(output);
    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        if stream == "stderr" {
            tracing::warn!(command, stream, "{line}");
        } else {
            tracing::info!(command, stream, "{line}");
        }
    }
}

pub fn log_command_failed(command: &str, err: &CommandError) {
    tracing::error!(command, error = %err, "command failed");
}

pub fn log_shutdown_started(in_flight: usize) {
    tracing::info!(in_flight, "shutdown requested, waiting for running commands");
}

pub fn log_shutdown_complete(abandoned: usize) {
    if abandoned == 0 {
        tracing::info!("all commands finished, shutting down");
    } else {
        tracing::warn!(abandoned, "grace period elapsed, remaining commands will be killed");
    }
}
