// Server loop module
// Accepts connections until shutdown, then waits for running commands

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;

use super::connection::accept_connection;
use super::signal::wait_for_shutdown;
use crate::config::AppState;
use crate::logger;

/// Run the accept loop until `shutdown` turns `true`
///
/// After the listener is closed, running command executions get
/// `performance.shutdown_grace` seconds to finish. Whatever is still running
/// afterwards is killed when the runtime drops its tasks.
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    mut shutdown: watch::Receiver<bool>,
) {
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => logger::log_error(&format!("Failed to accept connection: {e}")),
                }
            }
            () = wait_for_shutdown(&mut shutdown) => break,
        }
    }

    drop(listener);

    let tracker = &state.tracker;
    logger::log_shutdown_started(tracker.in_flight());
    let grace = Duration::from_secs(state.config.performance.shutdown_grace);
    let abandoned = if tracker.wait_idle(grace).await {
        0
    } else {
        tracker.in_flight()
    };
    logger::log_shutdown_complete(abandoned);
}
