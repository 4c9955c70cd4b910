//! Shutdown coordination for the bootstrap pipeline.

use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

use crate::lifecycle::signals::TerminationSignal;

/// Coordinator for termination requests.
///
/// Provides a broadcast channel that every stage can subscribe to.
pub struct Shutdown {
    /// Broadcast channel sender.
    tx: broadcast::Sender<TerminationSignal>,
}

impl Shutdown {
    /// Create a new shutdown coordinator.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(4);
        Self { tx }
    }

    /// Subscribe to termination requests.
    pub fn subscribe(&self) -> ShutdownListener {
        ShutdownListener {
            rx: self.tx.subscribe(),
        }
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self, signal: TerminationSignal) {
        let _ = self.tx.send(signal);
    }

    /// Get the number of active subscribers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Shutdown {
    fn clone(&self) -> Self {
        Self { tx: self.tx.clone() }
    }
}

/// Receiving side of [`Shutdown`].
pub struct ShutdownListener {
    rx: broadcast::Receiver<TerminationSignal>,
}

impl ShutdownListener {
    /// Resolve once a termination signal is delivered.
    ///
    /// Pends forever if every [`Shutdown`] handle has been dropped.
    pub async fn signalled(&mut self) -> TerminationSignal {
        loop {
            match self.rx.recv().await {
                Ok(signal) => return signal,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => std::future::pending::<()>().await,
            }
        }
    }

    /// Non-blocking check for a signal that already arrived.
    pub fn pending(&mut self) -> Option<TerminationSignal> {
        loop {
            match self.rx.try_recv() {
                Ok(signal) => return Some(signal),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }
}
