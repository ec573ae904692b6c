//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the
//! exec handling itself.

pub mod mime;
pub mod response;

// Re-export commonly used types
pub use mime::is_json_content_type;
pub use response::{
    build_404_response, build_413_response, build_direct_response, build_error_response,
    build_health_response, build_json_response,
};
