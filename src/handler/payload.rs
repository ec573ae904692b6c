//! Exec request payload
//!
//! Decodes the optional JSON body and assembles the argument list.

use hyper::body::Bytes;
use serde::{Deserialize, Deserializer};

use crate::error::HandlerError;
use crate::http::is_json_content_type;
use crate::placeholder::Resolver;

/// Extra arguments and stdin supplied by the client
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
pub struct ExecPayload {
    /// `null` reads as an empty list
    #[serde(default, deserialize_with = "null_as_empty")]
    pub args: Vec<String>,
    /// `None` when the field is absent, which differs from an empty string
    #[serde(default)]
    pub stdin: Option<String>,
}

impl ExecPayload {
    /// Decode the buffered body when it is non-empty and declared as JSON
    ///
    /// Any other body leaves the payload empty without error.
    pub fn from_body(body: &Bytes, content_type: Option<&str>) -> Result<Self, HandlerError> {
        if body.is_empty() || !is_json_content_type(content_type) {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(body)?)
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Resolved static arguments followed by the client's arguments verbatim
pub fn assemble_args(
    static_args: &[String],
    resolver: &dyn Resolver,
    payload_args: &[String],
) -> Vec<String> {
    let mut argv = Vec::with_capacity(static_args.len() + payload_args.len());
    argv.extend(static_args.iter().map(|arg| resolver.resolve(arg, "")));
    argv.extend(payload_args.iter().cloned());
    argv
}
