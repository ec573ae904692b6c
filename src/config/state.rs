// Application state module
// Immutable per-process state shared by all connections

use std::sync::Arc;

use super::types::{Config, Route, RouteMatch};
use crate::command::{CommandRunner, ExecTracker, ProcessRunner};
use crate::handler::{next, ExecHandler, Next};

/// An exec route ready to serve requests
pub struct MountedRoute {
    pub name: String,
    pub rule: RouteMatch,
    pub handler: ExecHandler,
    pub next: Box<dyn Next>,
}

/// Application state
pub struct AppState {
    pub config: Config,
    pub routes: Vec<MountedRoute>,
    /// Running command executions, awaited on shutdown
    pub tracker: Arc<ExecTracker>,
}

impl AppState {
    /// Build state with a process runner for every configured route
    pub fn new(config: Config) -> Self {
        let tracker = Arc::new(ExecTracker::new());
        let runner_tracker = Arc::clone(&tracker);
        Self::with_runners(config, tracker, move |route| {
            Arc::new(ProcessRunner::from_config(&route.exec, Arc::clone(&runner_tracker)))
                as Arc<dyn CommandRunner>
        })
    }

    /// Build state with runners supplied by `make_runner`
    pub fn with_runners(
        config: Config,
        tracker: Arc<ExecTracker>,
        make_runner: impl Fn(&Route) -> Arc<dyn CommandRunner>,
    ) -> Self {
        let routes = config
            .routes
            .iter()
            .enumerate()
            .map(|(index, route)| MountedRoute {
                name: route.display_name(index),
                rule: route.match_rule.clone(),
                handler: ExecHandler::new(
                    route.exec.args.clone(),
                    route.exec.pass_thru,
                    make_runner(route),
                ),
                next: next::from_action(&route.next),
            })
            .collect();

        Self {
            config,
            routes,
            tracker,
        }
    }
}
