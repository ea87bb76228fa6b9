//! Shutdown coordination for the bridge.

use tokio::sync::broadcast::{self, error::TryRecvError};

/// Coordinator for shutdown.
///
/// The watch client and the liveness server each hold a receiver; triggering
/// closes the watch (even mid-poll) and stops the server.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    ///
    /// Subscribe before triggering; late receivers miss the signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal. Repeated calls are harmless.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of subscribers still holding a receiver.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-blocking check of a shutdown receiver.
///
/// A delivered value, a lagged receiver (several triggers overflowed the
/// channel) and a dropped coordinator all count as fired.
pub fn has_fired(rx: &mut broadcast::Receiver<()>) -> bool {
    !matches!(rx.try_recv(), Err(TryRecvError::Empty))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_all_subscribers() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.clone().subscribe();
        assert_eq!(shutdown.receiver_count(), 2);

        shutdown.trigger();
        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }

    #[test]
    fn test_repeated_trigger_still_fires() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        assert!(!has_fired(&mut rx));

        shutdown.trigger();
        shutdown.trigger();
        shutdown.trigger();
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Lagged(_))));

        let mut rx = shutdown.subscribe();
        shutdown.trigger();
        shutdown.trigger();
        assert!(has_fired(&mut rx));
    }

    #[test]
    fn test_dropped_coordinator_counts_as_fired() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();
        drop(shutdown);
        assert!(has_fired(&mut rx));
    }
}
