//! Broadcast channel carrying a session's `UiEvent`s to renderers.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::broadcast;
use weft_core::UiEvent;

/// Default broadcast channel capacity.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Ordered push subscription of one session's [`UiEvent`]s.
///
/// Non-blocking: `emit` never awaits. Slow receivers lag rather than block
/// the sender, and a receiver only sees events sent after it subscribed.
#[derive(Debug)]
pub struct UiChannel {
    tx: broadcast::Sender<UiEvent>,
    emit_count: AtomicU64,
}

impl UiChannel {
    /// Create a channel with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a channel with a custom capacity (at least 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self {
            tx,
            emit_count: AtomicU64::new(0),
        }
    }

    /// Emit an event to all subscribers.
    ///
    /// Returns the number of receivers that got the event, 0 when nobody is
    /// subscribed.
    pub fn emit(&self, event: UiEvent) -> usize {
        let _ = self.emit_count.fetch_add(1, Ordering::Relaxed);
        self.tx.send(event).unwrap_or(0)
    }

    /// Subscribe to events emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.tx.subscribe()
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Total number of events emitted.
    pub fn emit_count(&self) -> u64 {
        self.emit_count.load(Ordering::Relaxed)
    }
}

impl Default for UiChannel {
    fn default() -> Self {
        Self::new()
    }
}
