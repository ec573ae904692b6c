// Signal handling module
//
// Supported signals:
// - SIGTERM: Graceful shutdown
// - SIGINT:  Graceful shutdown (Ctrl+C)

use tokio::sync::watch;

use crate::logger;

/// Start the signal listener task
///
/// The returned receiver flips to `true` once a shutdown signal arrives.
/// Registration errors are returned instead of being deferred to the task.
#[cfg(unix)]
pub fn start_signal_handler() -> std::io::Result<watch::Receiver<bool>> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        tracing::info!(signal = name, pid = std::process::id(), "shutdown signal received");
        let _ = tx.send(true);
    });

    Ok(rx)
}

/// Fallback for platforms without Unix signals: only Ctrl+C is handled
#[cfg(not(unix))]
pub fn start_signal_handler() -> std::io::Result<watch::Receiver<bool>> {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Ctrl+C received");
                let _ = tx.send(true);
            }
            Err(e) => logger::log_error(&format!("Failed to listen for Ctrl+C: {e}")),
        }
    });

    Ok(rx)
}

/// Resolve once shutdown was requested or the sender is gone
pub async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    if rx.wait_for(|requested| *requested).await.is_err() {
        logger::log_warning("Signal listener stopped, shutting down");
    }
}
