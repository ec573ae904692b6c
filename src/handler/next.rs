//! Downstream handlers
//!
//! The handler an exec route delegates to in pass-through mode.

use async_trait::async_trait;
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use hyper::header::CONTENT_TYPE;
use hyper::{Request, Response};

use crate::config::NextAction;
use crate::error::HandlerError;
use crate::http;

/// Next handler in the chain; receives the request with its body restored
#[async_trait]
pub trait Next: Send + Sync {
    async fn call(&self, req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, HandlerError>;
}

/// Build the configured next handler
pub fn from_action(action: &NextAction) -> Box<dyn Next> {
    match action {
        NextAction::Direct {
            status,
            body,
            content_type,
        } => Box::new(Direct {
            status: *status,
            body: body.clone(),
            content_type: content_type.clone(),
        }),
        NextAction::Echo => Box::new(Echo),
    }
}

/// Fixed response
pub struct Direct {
    status: u16,
    body: Option<String>,
    content_type: Option<String>,
}

#[async_trait]
impl Next for Direct {
    async fn call(&self, _req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, HandlerError> {
        Ok(http::build_direct_response(
            self.status,
            self.body.as_deref(),
            self.content_type.as_deref(),
        ))
    }
}

/// Returns the request body with its content type
pub struct Echo;

#[async_trait]
impl Next for Echo {
    async fn call(&self, req: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, HandlerError> {
        let (parts, body) = req.into_parts();
        let content_type = parts
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);
        let bytes = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(never) => match never {},
        };

        let mut builder = Response::builder().status(200);
        if let Some(content_type) = content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        builder.body(Full::new(bytes)).map_err(|e| HandlerError::Status {
            code: hyper::StatusCode::INTERNAL_SERVER_ERROR,
            message: e.to_string(),
        })
    }
}
