//! Server lifecycle signal.
//!
//! Shutdown runs in two steps. [`Shutdown::request`] clears the running flag:
//! the supervisor stops accepting and broadcasts the shutdown notice, while
//! sessions keep serving so the notice can still reach their clients. Once the
//! supervisor has closed the listener it calls [`Shutdown::close`], and every
//! session closes its connection.

use tokio::sync::watch;

/// Lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting and serving
    Running,
    /// Shutdown requested; notices are being broadcast
    Draining,
    /// Listener closed; sessions must close
    Closed,
}

/// Broadcast lifecycle flag shared by the supervisor, sessions and monitor.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<Phase>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    /// Signal in the [`Phase::Running`] phase.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Phase::Running);
        Self { tx }
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        *self.tx.borrow()
    }

    /// Whether the server is still accepting connections.
    pub fn is_running(&self) -> bool {
        self.phase() == Phase::Running
    }

    /// Clear the running flag. Returns `false` if shutdown was already under
    /// way.
    pub fn request(&self) -> bool {
        self.tx.send_if_modified(|phase| {
            if *phase == Phase::Running {
                *phase = Phase::Draining;
                true
            } else {
                false
            }
        })
    }

    /// Tell sessions to close their connections.
    pub fn close(&self) {
        self.tx.send_replace(Phase::Closed);
    }

    /// Resolve once shutdown has been requested.
    pub async fn requested(&self) {
        self.wait_for(|phase| phase != Phase::Running).await;
    }

    /// Resolve once the listener is closed.
    pub async fn closed(&self) {
        self.wait_for(|phase| phase == Phase::Closed).await;
    }

    async fn wait_for(&self, done: impl Fn(Phase) -> bool) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close under us.
        let _ = rx.wait_for(|phase| done(*phase)).await;
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;

    #[test]
    fn request_is_idempotent() {
        let shutdown = Shutdown::new();
        assert!(shutdown.is_running());
        assert!(shutdown.request());
        assert!(!shutdown.request());
        assert_eq!(shutdown.phase(), Phase::Draining);
    }

    #[test]
    fn request_after_close_keeps_closed() {
        let shutdown = Shutdown::new();
        shutdown.close();
        assert!(!shutdown.request());
        assert_eq!(shutdown.phase(), Phase::Closed);
    }

    #[tokio::test]
    async fn waiters_wake_on_their_phase() {
        let shutdown = Arc::new(Shutdown::new());

        let waiter = {
            let shutdown = Arc::clone(&shutdown);
            tokio::spawn(async move { shutdown.closed().await })
        };

        shutdown.request();
        shutdown.requested().await;
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        shutdown.close();
        tokio::time::timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
    }
}
