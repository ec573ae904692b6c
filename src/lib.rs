//! HTTP exec handler
//!
//! Runs a configured external command for each matching HTTP request.
//! Arguments come from the route's static list, with `{placeholder}`
//! substitution against the request, followed by any arguments the client
//! sends in a JSON body. The result is reported as a JSON status object, or
//! the request is passed on to the route's next handler.

pub mod command;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod placeholder;
pub mod routing;
pub mod server;
