// In-flight execution tracking
// Counts running commands so shutdown can wait for them

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Counter of executions that have started and not yet finished
#[derive(Debug, Default)]
pub struct ExecTracker {
    in_flight: AtomicUsize,
    idle: Notify,
}

/// Slot held for the lifetime of one execution
#[derive(Debug)]
pub struct ExecGuard {
    tracker: Arc<ExecTracker>,
}

impl ExecTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new execution; the slot is released when the guard drops
    pub fn enter(self: &Arc<Self>) -> ExecGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        ExecGuard {
            tracker: Arc::clone(self),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Wait until no execution is running
    ///
    /// Returns `false` when `timeout` elapses first.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.idle.notified();
                tokio::pin!(notified);
                notified.as_mut().enable();
                if self.in_flight() == 0 {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}

impl Drop for ExecGuard {
    fn drop(&mut self) {
        if self.tracker.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.tracker.idle.notify_waiters();
        }
    }
}
