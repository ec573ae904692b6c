// Configuration module entry point
// Loads, validates and shares the server configuration

mod state;
mod types;
mod validate;

use std::net::SocketAddr;

// Re-export public types
pub use state::{AppState, MountedRoute};
pub use types::{
    Config, ExecConfig, HeaderMatcher, HealthConfig, HttpConfig, LoggingConfig, NextAction,
    PerformanceConfig, Route, RouteMatch, ServerConfig,
};

/// Environment variable prefix, e.g. `EXEC_SERVER__PORT=9000`
const ENV_PREFIX: &str = "EXEC";

impl Config {
    /// Load configuration from specified file path (extension optional)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        Self::builder()?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()
    }

    /// Parse configuration from a TOML document, defaults applied
    pub fn from_toml(document: &str) -> Result<Self, config::ConfigError> {
        Self::builder()?
            .add_source(config::File::from_str(document, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError>
    {
        config::Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.shutdown_grace", 10)?
            .set_default("http.server_name", "http-exec")?
            .set_default("http.max_body_size", 10_485_760) // 10MB
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}
