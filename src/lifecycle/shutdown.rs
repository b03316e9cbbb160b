//! Shutdown coordination.
//!
//! A `watch` channel holds a single "stopping" flag. Listeners created after
//! the trigger still see it, so the order of subscribing and signalling does
//! not matter.

use std::sync::Arc;
use tokio::sync::watch;

/// Handle that starts a graceful shutdown. Cheap to clone.
#[derive(Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

/// Waits for a [`Shutdown`] to be triggered.
#[derive(Clone)]
pub struct ShutdownListener {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn listener(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }

    /// Mark the process as stopping. Repeated calls are no-ops.
    pub fn trigger(&self) {
        if !self.tx.send_replace(true) {
            tracing::info!(listeners = self.tx.receiver_count(), "Shutdown triggered");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownListener {
    /// Resolve once shutdown is triggered, or when every [`Shutdown`] handle
    /// is gone and nothing can trigger it any more.
    pub async fn wait(mut self) {
        let _ = self.rx.wait_for(|stopping| *stopping).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_wakes_listeners() {
        let shutdown = Shutdown::new();
        let a = tokio::spawn(shutdown.listener().wait());
        let b = tokio::spawn(shutdown.clone().listener().wait());
        shutdown.trigger();
        assert!(shutdown.is_triggered());
        a.await.unwrap();
        b.await.unwrap();
    }

    #[tokio::test]
    async fn test_late_listener_sees_earlier_trigger() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(1), shutdown.listener().wait())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_untriggered_listener_keeps_waiting() {
        let shutdown = Shutdown::new();
        let waited = tokio::time::timeout(Duration::from_millis(50), shutdown.listener().wait()).await;
        assert!(waited.is_err());
        assert!(!shutdown.is_triggered());
    }
}
