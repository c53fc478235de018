//! # weft-stream
//!
//! Turns a provider's raw streaming output into [`NormalizedEvent`]s:
//! - Frame reader: chunked bytes to JSON values (NDJSON or SSE `data:` lines)
//! - Per-provider decoders (Claude `stream_event` envelopes, Codex
//!   Responses-style events) behind the [`ProviderDecoder`] seam
//! - Index-keyed block accumulator with stable block ids
//! - Per-session normalizer state machine
//! - Usage unification and fail-open tool argument parsing
//!
//! [`NormalizedEvent`]: weft_core::NormalizedEvent

#![deny(unsafe_code)]

pub mod accumulator;
pub mod claude;
pub mod codex;
pub mod decoder;
pub mod errors;
pub mod frames;
pub mod normalizer;
pub mod tool_parsing;
pub mod types;
pub mod usage;

pub use accumulator::{BlockAccumulator, ContentBlockState};
pub use decoder::{ProviderDecoder, decode_or_log, decoder_for};
pub use errors::{DecodeError, TransportError};
pub use frames::{MAX_LINE_BYTES, json_frames, json_frames_with_limit};
pub use normalizer::{Phase, StreamNormalizer};
pub use types::{ProviderFrame, ProviderUsage, RawDelta, RawProviderEvent};
pub use usage::unify;
