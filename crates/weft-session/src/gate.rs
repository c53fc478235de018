//! Completion gate between the projector and the UI channel.
//!
//! A turn can report completion twice (message-level usage and the terminal
//! turn result). The gate admits one `UiMessageComplete` per message and
//! drops the rest.

use tracing::debug;
use weft_core::UiEvent;

/// Admits at most one `UiMessageComplete` per message.
#[derive(Debug, Default)]
pub struct CompletionGate {
    completed: bool,
}

impl CompletionGate {
    /// Create an open gate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `event` should be delivered.
    ///
    /// `UiMessageStart` re-arms the gate for the new message.
    pub fn admit(&mut self, event: &UiEvent) -> bool {
        match event {
            UiEvent::MessageStart { .. } => {
                self.completed = false;
                true
            }
            UiEvent::MessageComplete { .. } if self.completed => {
                debug!("duplicate message completion, dropping");
                false
            }
            UiEvent::MessageComplete { .. } => {
                self.completed = true;
                true
            }
            _ => true,
        }
    }

    /// Re-arm the gate at a turn boundary.
    pub fn reset(&mut self) {
        self.completed = false;
    }
}
