//! Placeholder resolution module
//!
//! Substitutes `{name}` tokens in configured strings with values taken from
//! the current request, e.g. `{http.request.uri.query.name}`.
//!
//! Supported names:
//! - `http.request.method`, `http.request.uri`, `http.request.uri.path`
//! - `http.request.uri.query`, `http.request.uri.query.NAME`
//! - `http.request.host`, `http.request.hostport`, `http.request.port`
//! - `http.request.scheme`, `http.request.proto`
//! - `http.request.header.NAME`
//! - `http.request.remote`, `http.request.remote.host`, `http.request.remote.port`
//! - `env.NAME`, `time.now.unix`, `time.now.rfc3339`

use hyper::header::HOST;
use hyper::{HeaderMap, Method, Request, Uri, Version};
use std::net::SocketAddr;

/// Resolves named placeholders against per-request values
pub trait Resolver: Send + Sync {
    /// Value for a placeholder name, `None` when unknown
    fn lookup(&self, key: &str) -> Option<String>;

    /// Replace every `{name}` token in `template`
    ///
    /// Unknown names become `default`. `\{` and `\}` produce literal braces;
    /// `{}` and an unterminated `{` are copied as-is.
    fn resolve(&self, template: &str, default: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(pos) = rest.find(['{', '\\']) {
            out.push_str(&rest[..pos]);
            let tail = &rest[pos..];

            if let Some(escaped) = tail.strip_prefix('\\') {
                match escaped.chars().next() {
                    Some(c @ ('{' | '}')) => {
                        out.push(c);
                        rest = &escaped[1..];
                    }
                    _ => {
                        out.push('\\');
                        rest = escaped;
                    }
                }
                continue;
            }

            let Some(end) = tail.find('}') else {
                out.push_str(tail);
                return out;
            };
            let key = &tail[1..end];
            if key.is_empty() {
                out.push_str("{}");
            } else {
                out.push_str(&self.lookup(key).unwrap_or_else(|| default.to_string()));
            }
            rest = &tail[end + 1..];
        }

        out.push_str(rest);
        out
    }
}

/// Request-scoped resolver
#[derive(Debug, Clone)]
pub struct RequestReplacer {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    remote: Option<SocketAddr>,
}

impl RequestReplacer {
    pub fn from_request<B>(req: &Request<B>, remote: Option<SocketAddr>) -> Self {
        Self {
            method: req.method().clone(),
            uri: req.uri().clone(),
            version: req.version(),
            headers: req.headers().clone(),
            remote,
        }
    }

    fn hostport(&self) -> Option<String> {
        self.headers
            .get(HOST)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
            .or_else(|| self.uri.authority().map(ToString::to_string))
    }

    fn query_value(&self, name: &str) -> Option<String> {
        let query = self.uri.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    }

    fn header_value(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        (!values.is_empty()).then(|| values.join(","))
    }
}

impl Resolver for RequestReplacer {
    fn lookup(&self, key: &str) -> Option<String> {
        if let Some(name) = key.strip_prefix("http.request.uri.query.") {
            return self.query_value(name);
        }
        if let Some(name) = key.strip_prefix("http.request.header.") {
            return self.header_value(name);
        }
        if let Some(name) = key.strip_prefix("env.") {
            return std::env::var(name).ok();
        }

        match key {
            "http.request.method" => Some(self.method.to_string()),
            "http.request.uri" => Some(
                self.uri
                    .path_and_query()
                    .map_or_else(|| self.uri.path().to_string(), ToString::to_string),
            ),
            "http.request.uri.path" => Some(self.uri.path().to_string()),
            "http.request.uri.query" => Some(self.uri.query().unwrap_or_default().to_string()),
            "http.request.hostport" => self.hostport(),
            "http.request.host" => self.hostport().map(|hp| split_host_port(&hp).0.to_string()),
            "http.request.port" => self
                .hostport()
                .and_then(|hp| split_host_port(&hp).1.map(ToString::to_string)),
            "http.request.scheme" => {
                Some(self.uri.scheme_str().unwrap_or("http").to_string())
            }
            "http.request.proto" => Some(format!("{:?}", self.version)),
            "http.request.remote" => self.remote.map(|addr| addr.to_string()),
            "http.request.remote.host" => self.remote.map(|addr| addr.ip().to_string()),
            "http.request.remote.port" => self.remote.map(|addr| addr.port().to_string()),
            "time.now.unix" => Some(chrono::Utc::now().timestamp().to_string()),
            "time.now.rfc3339" => Some(chrono::Utc::now().to_rfc3339()),
            _ => None,
        }
    }
}

/// Split `host[:port]`, keeping IPv6 literals intact
fn split_host_port(hostport: &str) -> (&str, Option<&str>) {
    if hostport.starts_with('[') {
        return match hostport.find(']') {
            Some(end) => {
                let port = hostport[end + 1..].strip_prefix(':');
                (&hostport[..=end], port)
            }
            None => (hostport, None),
        };
    }
    match hostport.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (hostport, None),
    }
}
