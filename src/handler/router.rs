//! Request routing dispatch module
//!
//! Entry point for HTTP request processing, responsible for body size checks,
//! health probes, route matching and dispatching to the exec handler.

use crate::config::{AppState, MountedRoute};
use crate::error::BoxError;
use crate::http;
use crate::logger::{self, AccessLogEntry};
use crate::placeholder::RequestReplacer;
use crate::routing;
use http_body_util::{Full, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderName, HeaderValue, CONTENT_LENGTH, REFERER, SERVER, USER_AGENT};
use hyper::{Request, Response, Version};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// Request line details kept for the access log
struct RequestSummary {
    method: String,
    path: String,
    query: Option<String>,
    version: Version,
    referer: Option<String>,
    user_agent: Option<String>,
}

impl RequestSummary {
    fn of<B>(req: &Request<B>) -> Self {
        let header = |name: HeaderName| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };
        Self {
            method: req.method().to_string(),
            path: req.uri().path().to_string(),
            query: req.uri().query().map(ToString::to_string),
            version: req.version(),
            referer: header(REFERER),
            user_agent: header(USER_AGENT),
        }
    }
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    remote_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<BoxError>,
{
    let started = Instant::now();
    let summary = state
        .config
        .logging
        .access_log
        .then(|| RequestSummary::of(&req));

    let (mut response, route_name) = dispatch(req, &state, remote_addr).await;

    if let Ok(value) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, value);
    }

    if let Some(summary) = summary {
        log_access(&state, summary, remote_addr, &response, route_name, started);
    }

    Ok(response)
}

async fn dispatch<'s, B>(
    req: Request<B>,
    state: &'s AppState,
    remote_addr: SocketAddr,
) -> (Response<Full<Bytes>>, Option<&'s str>)
where
    B: Body<Data = Bytes> + Send,
    B::Error: Into<BoxError>,
{
    let max_body_size = state.config.http.max_body_size;

    // 1. Check declared body size
    if let Some(resp) = check_body_size(&req, max_body_size) {
        return (resp, None);
    }

    // 2. Health check endpoints
    let health = &state.config.health;
    let path = req.uri().path();
    if health.enabled && (path == health.liveness_path || path == health.readiness_path) {
        return (http::build_health_response("ok"), None);
    }

    // 3. Exec routes, first match wins
    let Some(route) = find_route(&req, state) else {
        return (http::build_404_response(), None);
    };

    let replacer = RequestReplacer::from_request(&req, Some(remote_addr));
    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let req = req.map(|body| Limited::new(body, limit));

    let response = match route.handler.serve(req, &replacer, route.next.as_ref()).await {
        Ok(resp) => resp,
        Err(err) => {
            logger::log_warning(&format!("route {}: {err}", route.name));
            http::build_error_response(err.status(), &err.to_string())
        }
    };
    (response, Some(route.name.as_str()))
}

fn find_route<'s, B>(req: &Request<B>, state: &'s AppState) -> Option<&'s MountedRoute> {
    routing::match_route(
        req.uri().path(),
        req.method(),
        req.headers(),
        &state.routes,
        |route| &route.rule,
    )
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size<B>(req: &Request<B>, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = req.headers().get(CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_warning(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

fn log_access(
    state: &AppState,
    summary: RequestSummary,
    remote_addr: SocketAddr,
    response: &Response<Full<Bytes>>,
    route: Option<&str>,
    started: Instant,
) {
    let mut entry = AccessLogEntry::new(remote_addr.ip().to_string(), summary.method, summary.path);
    entry.query = summary.query;
    entry.http_version = version_label(summary.version).to_string();
    entry.status = response.status().as_u16();
    entry.body_bytes = response
        .body()
        .size_hint()
        .exact()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0);
    entry.referer = summary.referer;
    entry.user_agent = summary.user_agent;
    entry.route = route.map(ToString::to_string);
    entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);

    logger::log_access(&entry, &state.config.logging.access_log_format);
}

const fn version_label(version: Version) -> &'static str {
    match version {
        Version::HTTP_09 => "0.9",
        Version::HTTP_10 => "1.0",
        Version::HTTP_2 => "2",
        Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{CommandRunner, ExecTracker, Input};
    use crate::config::Config;
    use crate::error::CommandError;
    use async_trait::async_trait;
    use http_body_util::BodyExt;
    use hyper::StatusCode;
    use std::sync::Mutex;
    use tokio::io::AsyncReadExt;

    #[derive(Default)]
    struct FakeRunner {
        calls: Mutex<Vec<(Vec<String>, Option<String>)>>,
        exit_code: Option<i32>,
    }

    #[async_trait]
    impl CommandRunner for FakeRunner {
        async fn run(&self, argv: &[String], input: Option<Input>) -> Result<(), CommandError> {
            let stdin = match input {
                Some(mut reader) => {
                    let mut s = String::new();
                    reader.read_to_string(&mut s).await.unwrap();
                    Some(s)
                }
                None => None,
            };
            self.calls.lock().unwrap().push((argv.to_vec(), stdin));
            self.exit_code.map_or(Ok(()), |code| Err(CommandError::Exit(code)))
        }
    }

    const CONFIG: &str = r#"
        [http]
        server_name = "exec-test"
        max_body_size = 64

        [[routes]]
        name = "greet"
        match = { path = "/greet", methods = ["POST"] }
        exec = { command = "greet", args = ["hello", "{http.request.uri.query.name}"] }

        [[routes]]
        name = "mirror"
        match = { path = "/mirror" }
        exec = { command = "mirror", pass_thru = true }
        next = { type = "echo" }

        [[routes]]
        name = "broken"
        match = { path = "/broken" }
        exec = { command = "broken" }
    "#;

    fn state_with(runner: &Arc<FakeRunner>) -> Arc<AppState> {
        let config = Config::from_toml(CONFIG).unwrap();
        let failing = Arc::new(FakeRunner {
            exit_code: Some(1),
            ..FakeRunner::default()
        });
        Arc::new(AppState::with_runners(
            config,
            Arc::new(ExecTracker::new()),
            |route| {
                if route.exec.command == "broken" {
                    Arc::clone(&failing) as Arc<dyn CommandRunner>
                } else {
                    Arc::clone(runner) as Arc<dyn CommandRunner>
                }
            },
        ))
    }

    fn remote() -> SocketAddr {
        "192.0.2.10:40000".parse().unwrap()
    }

    fn request(method: &str, uri: &str, content_type: Option<&str>, body: &str) -> Request<Full<Bytes>> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header("content-type", ct);
        }
        builder.body(Full::new(Bytes::from(body.to_string()))).unwrap()
    }

    async fn send(state: &Arc<AppState>, req: Request<Full<Bytes>>) -> (StatusCode, String) {
        let resp = handle_request(req, Arc::clone(state), remote()).await.unwrap();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_exec_route_success() {
        let runner = Arc::new(FakeRunner::default());
        let state = state_with(&runner);

        let req = request(
            "POST",
            "/greet?name=world",
            Some("application/json"),
            r#"{"args":["--loud"],"stdin":"hi"}"#,
        );
        let (status, body) = send(&state, req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"status":"success"}"#);
        let calls = runner.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![(
                vec!["hello".to_string(), "world".to_string(), "--loud".to_string()],
                Some("hi".to_string())
            )]
        );
    }

    #[tokio::test]
    async fn test_command_failure_is_json_500() {
        let runner = Arc::new(FakeRunner::default());
        let state = state_with(&runner);

        let (status, body) = send(&state, request("POST", "/broken", None, "")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, r#"{"error":"exit code 1"}"#);
    }

    #[tokio::test]
    async fn test_pass_thru_echoes_body() {
        let runner = Arc::new(FakeRunner::default());
        let state = state_with(&runner);

        let (status, body) = send(&state, request("PUT", "/mirror", Some("text/plain"), "raw")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "raw");
        assert_eq!(runner.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unmatched_route_is_404() {
        let runner = Arc::new(FakeRunner::default());
        let state = state_with(&runner);

        let (status, _) = send(&state, request("POST", "/nothing", None, "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Method not in the route's list
        let (status, _) = send(&state, request("GET", "/greet", None, "")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_health_probe() {
        let runner = Arc::new(FakeRunner::default());
        let state = state_with(&runner);

        let (status, body) = send(&state, request("GET", "/healthz", None, "")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_declared_length_over_limit() {
        let runner = Arc::new(FakeRunner::default());
        let state = state_with(&runner);

        let mut req = request("POST", "/greet", None, "");
        req.headers_mut()
            .insert(CONTENT_LENGTH, HeaderValue::from_static("1000"));
        let (status, _) = send(&state, req).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_streamed_body_over_limit() {
        let runner = Arc::new(FakeRunner::default());
        let state = state_with(&runner);

        let big = "x".repeat(100);
        let (status, _) = send(&state, request("POST", "/greet", None, &big)).await;

        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        let runner = Arc::new(FakeRunner::default());
        let state = state_with(&runner);

        let req = request("POST", "/greet", Some("application/json"), "{not json");
        let (status, _) = send(&state, req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_server_header() {
        let runner = Arc::new(FakeRunner::default());
        let state = state_with(&runner);

        let resp = handle_request(request("GET", "/missing", None, ""), state, remote())
            .await
            .unwrap();
        assert_eq!(resp.headers().get(SERVER).unwrap(), "exec-test");
    }

    #[test]
    fn test_version_label() {
        assert_eq!(version_label(Version::HTTP_10), "1.0");
        assert_eq!(version_label(Version::HTTP_11), "1.1");
        assert_eq!(version_label(Version::HTTP_2), "2");
    }
}
