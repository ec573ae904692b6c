//! Request handler module
//!
//! Responsible for request routing dispatch and exec handling.

pub mod exec;
pub mod next;
pub mod payload;
pub mod router;

// Re-export main entry point
pub use exec::{ExecHandler, ExecOutcome};
pub use next::Next;
pub use payload::ExecPayload;
pub use router::handle_request;
