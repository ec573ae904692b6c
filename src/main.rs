use std::sync::Arc;

use http_exec::config::{AppState, Config};
use http_exec::{logger, server};

/// Config file used when none is given on the command line (extension optional)
const DEFAULT_CONFIG: &str = "config";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG.to_string());

    let cfg = Config::load_from(&config_path)?;
    cfg.validate()?;
    logger::init(&cfg.logging).map_err(|e| e as Box<dyn std::error::Error>)?;

    // Size the runtime from the workers setting, default is one per core
    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }
    tracing::info!(workers = ?cfg.server.workers, config = %config_path, "starting runtime");

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(cfg))
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;
    let shutdown = server::start_signal_handler()?;

    logger::log_server_start(&addr, &cfg);

    let state = Arc::new(AppState::new(cfg));
    server::start_server_loop(listener, state, shutdown).await;
    Ok(())
}
