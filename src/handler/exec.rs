//! Exec handler
//!
//! Runs a route's command for each request, then either answers with a JSON
//! status object or hands the request to the next handler (pass-through).

use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::header::CONTENT_TYPE;
use hyper::{Request, Response, StatusCode};
use serde::Serialize;
use std::sync::Arc;

use super::next::Next;
use super::payload::{assemble_args, ExecPayload};
use crate::command::{input_from_string, CommandRunner};
use crate::error::{BoxError, CommandError, HandlerError};
use crate::http;
use crate::logger;
use crate::placeholder::Resolver;

/// Per-route request handler; immutable and shared by all requests
pub struct ExecHandler {
    args: Vec<String>,
    pass_thru: bool,
    runner: Arc<dyn CommandRunner>,
}

/// Outcome of one execution as reported to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecOutcome {
    Success,
    Failure(String),
}

/// Wire form of [`ExecOutcome`]; exactly one field is set
#[derive(Serialize)]
struct StatusBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl From<Result<(), CommandError>> for ExecOutcome {
    fn from(result: Result<(), CommandError>) -> Self {
        match result {
            Ok(()) => Self::Success,
            Err(err) => Self::Failure(err.to_string()),
        }
    }
}

impl ExecOutcome {
    /// `{"status":"success"}` with 200, or `{"error":...}` with 500
    pub fn to_response(&self) -> Response<Full<Bytes>> {
        match self {
            Self::Success => http::build_json_response(
                StatusCode::OK,
                &StatusBody {
                    status: Some("success"),
                    error: None,
                },
            ),
            Self::Failure(message) => http::build_json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &StatusBody {
                    status: None,
                    error: Some(message),
                },
            ),
        }
    }
}

impl ExecHandler {
    pub fn new(args: Vec<String>, pass_thru: bool, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            args,
            pass_thru,
            runner,
        }
    }

    /// Handle one request
    ///
    /// Body read and decode failures abort before the command runs. Command
    /// failures never abort: they become a 500 JSON response, or in
    /// pass-through mode an error log entry.
    pub async fn serve<B>(
        &self,
        req: Request<B>,
        resolver: &dyn Resolver,
        next: &dyn Next,
    ) -> Result<Response<Full<Bytes>>, HandlerError>
    where
        B: Body<Data = Bytes> + Send,
        B::Error: Into<BoxError>,
    {
        let (parts, body) = req.into_parts();
        let body = body
            .collect()
            .await
            .map_err(|e| HandlerError::from_body_error(e.into()))?
            .to_bytes();

        let content_type = parts.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());
        let payload = ExecPayload::from_body(&body, content_type)?;

        let argv = assemble_args(&self.args, resolver, &payload.args);
        let input = payload.stdin.map(input_from_string);
        let result = self.runner.run(&argv, input).await;

        if self.pass_thru {
            if let Err(err) = &result {
                logger::log_error(&format!("exec {argv:?}: {err}"));
            }
            return next.call(Request::from_parts(parts, Full::new(body))).await;
        }

        Ok(ExecOutcome::from(result).to_response())
    }
}
