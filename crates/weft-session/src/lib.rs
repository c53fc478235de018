//! # weft-session
//!
//! Presentation side of the weft pipeline and the per-session drivers:
//! - [`UiProjector`]: `NormalizedEvent` to `UiEvent`, with message-scoped
//!   correlation maps and open-tool tracking
//! - [`CompletionGate`]: one `UiMessageComplete` per message
//! - [`UiChannel`]: broadcast subscription of a session's `UiEvent`s
//! - [`StreamSession`]: turn lock, cancellation and transport-failure handling
//! - [`SessionRegistry`]: isolated sessions keyed by id

#![deny(unsafe_code)]

pub mod channel;
pub mod errors;
pub mod gate;
pub mod projector;
pub mod registry;
pub mod session;

pub use channel::UiChannel;
pub use errors::{Result, SessionError};
pub use gate::CompletionGate;
pub use projector::UiProjector;
pub use registry::SessionRegistry;
pub use session::{SessionOptions, StreamSession, TurnOutcome};
