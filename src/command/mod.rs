//! Command execution module
//!
//! Defines the runner contract used by the exec handler, the tokio based
//! process runner, and the tracker that lets shutdown wait for executions.

pub mod process;
pub mod tracker;

pub use process::ProcessRunner;
pub use tracker::{ExecGuard, ExecTracker};

use async_trait::async_trait;
use tokio::io::AsyncRead;

use crate::error::CommandError;

/// Readable stream fed to a command's stdin
pub type Input = Box<dyn AsyncRead + Send + Unpin>;

/// Wrap a string as command input
pub fn input_from_string(value: String) -> Input {
    Box::new(std::io::Cursor::new(value.into_bytes()))
}

/// Executes a configured program with per-request arguments
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run with `argv` as arguments; `input` is absent when no stdin was supplied
    async fn run(&self, argv: &[String], input: Option<Input>) -> Result<(), CommandError>;
}
