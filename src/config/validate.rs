// Configuration validation
// Rejects configurations that cannot be served before the first request

use hyper::Method;

use super::types::{Config, NextAction, Route};
use crate::error::ConfigError;

impl Config {
    /// Check the whole configuration, returning the first problem found
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.get_socket_addr().map_err(ConfigError::Address)?;

        if self.http.max_body_size == 0 {
            return Err(ConfigError::ZeroBodySize);
        }

        if self.health.enabled {
            check_path("health.liveness_path", &self.health.liveness_path)?;
            check_path("health.readiness_path", &self.health.readiness_path)?;
        }

        for (index, route) in self.routes.iter().enumerate() {
            validate_route(route, &route.display_name(index))?;
        }

        Ok(())
    }
}

fn validate_route(route: &Route, name: &str) -> Result<(), ConfigError> {
    if route.exec.command.trim().is_empty() {
        return Err(ConfigError::EmptyCommand {
            route: name.to_string(),
        });
    }

    if let Some(path) = &route.match_rule.path {
        check_path(&format!("route {name}: match.path"), path)?;
    }
    if let Some(prefix) = &route.match_rule.prefix {
        check_path(&format!("route {name}: match.prefix"), prefix)?;
    }

    for method in route.match_rule.methods.iter().flatten() {
        if Method::from_bytes(method.as_bytes()).is_err() {
            return Err(ConfigError::InvalidMethod {
                route: name.to_string(),
                method: method.clone(),
            });
        }
    }

    if let NextAction::Direct { status, .. } = &route.next {
        if !(100..=599).contains(status) {
            return Err(ConfigError::InvalidStatus {
                route: name.to_string(),
                status: *status,
            });
        }
    }

    Ok(())
}

fn check_path(field: &str, path: &str) -> Result<(), ConfigError> {
    if path.starts_with('/') {
        Ok(())
    } else {
        Err(ConfigError::InvalidPath {
            field: field.to_string(),
            path: path.to_string(),
        })
    }
}
