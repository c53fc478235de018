//! # weft-core
//!
//! Foundation types shared by every weft crate:
//!
//! - [`usage`]: provider identity and the unified token [`Usage`] record
//! - [`content`]: block kinds, immutable block headers, typed delta payloads
//!   and finalized [`ContentValue`]s
//! - [`events`]: the provider-agnostic [`NormalizedEvent`] vocabulary and the
//!   presentation [`UiEvent`] vocabulary
//! - [`logging`]: `tracing` subscriber setup and an in-memory capture layer
//!   for tests
//! - [`text`]: UTF-8 safe truncation helpers

#![deny(unsafe_code)]

pub mod content;
pub mod events;
pub mod logging;
pub mod text;
pub mod usage;

pub use content::{BlockHeader, BlockKind, ContentValue, DeltaPayload};
pub use events::{NormalizedEvent, ToolType, UiEvent};
pub use usage::{ProviderKind, Usage};
