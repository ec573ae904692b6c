// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::collections::HashMap;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub health: HealthConfig,
    /// Exec routes, matched in order
    #[serde(default)]
    pub routes: Vec<Route>,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Log file path (optional, stderr if not set)
    #[serde(default)]
    pub log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub max_connections: Option<u64>,
    /// Seconds to wait for in-flight executions on shutdown
    pub shutdown_grace: u64,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub server_name: String,
    pub max_body_size: u64,
}

/// Health check configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HealthConfig {
    /// Enable health check endpoints
    #[serde(default = "default_health_enabled")]
    pub enabled: bool,
    /// Liveness probe path (default: /healthz)
    #[serde(default = "default_healthz_path")]
    pub liveness_path: String,
    /// Readiness probe path (default: /readyz)
    #[serde(default = "default_readyz_path")]
    pub readiness_path: String,
}

#[allow(clippy::missing_const_for_fn)]
fn default_health_enabled() -> bool {
    true
}

#[allow(clippy::missing_const_for_fn)]
fn default_healthz_path() -> String {
    "/healthz".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_readyz_path() -> String {
    "/readyz".to_string()
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            enabled: default_health_enabled(),
            liveness_path: default_healthz_path(),
            readiness_path: default_readyz_path(),
        }
    }
}

/// Exec route - matches requests and runs a command for them
#[derive(Debug, Deserialize, Clone)]
pub struct Route {
    /// Optional route name for identification
    #[serde(default)]
    pub name: Option<String>,
    /// Match conditions (path, prefix, methods, headers)
    #[serde(rename = "match", default)]
    pub match_rule: RouteMatch,
    /// Command to run for matched requests
    pub exec: ExecConfig,
    /// Handler that receives the request in pass-through mode
    #[serde(default)]
    pub next: NextAction,
}

impl Route {
    /// Name used in logs and error messages
    pub fn display_name(&self, index: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("#{index}"))
    }
}

/// Route matching conditions
#[derive(Debug, Deserialize, Clone, Default)]
pub struct RouteMatch {
    /// Path prefix match (e.g., "/hooks" matches "/hooks/deploy")
    #[serde(default)]
    pub prefix: Option<String>,
    /// Exact path match
    #[serde(default)]
    pub path: Option<String>,
    /// Allowed methods (any method when absent)
    #[serde(default)]
    pub methods: Option<Vec<String>>,
    /// Header matchers (optional)
    #[serde(default)]
    pub headers: Option<Vec<HeaderMatcher>>,
}

/// Header matching condition
#[derive(Debug, Deserialize, Clone)]
pub struct HeaderMatcher {
    /// Header name
    pub name: String,
    /// Expected value (exact match)
    #[serde(default)]
    pub exact: Option<String>,
    /// Prefix match
    #[serde(default)]
    pub prefix: Option<String>,
    /// Check if header is present
    #[serde(default)]
    pub present: Option<bool>,
}

/// Command execution settings for a route
#[derive(Debug, Deserialize, Clone)]
pub struct ExecConfig {
    /// Program to run
    pub command: String,
    /// Static arguments, placeholders resolved per request
    #[serde(default)]
    pub args: Vec<String>,
    /// Working directory
    #[serde(default)]
    pub directory: Option<String>,
    /// Extra environment variables
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Execution time limit in milliseconds, 0 disables it
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Wait for the command to exit before responding
    #[serde(default)]
    pub foreground: bool,
    /// Hand the request to `next` instead of answering with JSON
    #[serde(default)]
    pub pass_thru: bool,
}

#[allow(clippy::missing_const_for_fn)]
fn default_timeout_ms() -> u64 {
    10_000
}

/// Downstream handler used in pass-through mode
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NextAction {
    /// Fixed response
    Direct {
        #[serde(default = "default_direct_status")]
        status: u16,
        #[serde(default)]
        body: Option<String>,
        #[serde(default)]
        content_type: Option<String>,
    },
    /// Respond with the request body
    Echo,
}

#[allow(clippy::missing_const_for_fn)]
fn default_direct_status() -> u16 {
    200
}

impl Default for NextAction {
    fn default() -> Self {
        Self::Direct {
            status: default_direct_status(),
            body: None,
            content_type: None,
        }
    }
}
