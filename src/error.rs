//! Error types
//!
//! `HandlerError` aborts a single request, `CommandError` describes a failed
//! execution and `ConfigError` rejects a configuration before serving.

use hyper::StatusCode;
use std::time::Duration;

/// Boxed error used for request body failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that end request handling before a response is produced
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// The request body could not be read
    #[error("reading request body: {0}")]
    BodyRead(#[source] BoxError),

    /// The request body exceeded the configured limit while being read
    #[error("request body too large")]
    BodyTooLarge,

    /// The JSON body did not match the expected payload shape
    #[error("decoding request body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Failure reported by a downstream handler
    #[error("{message}")]
    Status { code: StatusCode, message: String },
}

impl HandlerError {
    /// Classify a body read error, recognising the length limit
    pub fn from_body_error(err: BoxError) -> Self {
        if err.is::<http_body_util::LengthLimitError>() {
            Self::BodyTooLarge
        } else {
            Self::BodyRead(err)
        }
    }

    /// HTTP status the error is rendered with
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BodyRead(_) | Self::Decode(_) => StatusCode::BAD_REQUEST,
            Self::BodyTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Status { code, .. } => *code,
        }
    }
}

/// Errors reported by a command runner
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("command not found: {0}")]
    NotFound(String),

    #[error("starting {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("exit code {0}")]
    Exit(i32),

    #[error("terminated by signal")]
    Signal,

    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    #[error("waiting for command: {0}")]
    Wait(#[source] std::io::Error),
}

impl CommandError {
    /// Classify a spawn failure for `command`
    pub fn spawn(command: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound(command.to_string())
        } else {
            Self::Spawn {
                command: command.to_string(),
                source,
            }
        }
    }
}

/// Configuration validation failures
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid listen address: {0}")]
    Address(String),

    #[error("route {route}: exec.command must not be empty")]
    EmptyCommand { route: String },

    #[error("route {route}: invalid next status {status}")]
    InvalidStatus { route: String, status: u16 },

    #[error("route {route}: invalid method '{method}'")]
    InvalidMethod { route: String, method: String },

    #[error("{field}: path '{path}' must start with '/'")]
    InvalidPath { field: String, path: String },

    #[error("http.max_body_size must be greater than zero")]
    ZeroBodySize,
}
