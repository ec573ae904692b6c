//! Routing module
//!
//! Selects the exec route for a request based on:
//! - Path (exact or prefix)
//! - Method list
//! - Header conditions

mod matcher;

pub use matcher::{match_path, match_route};
