//! Decode and transport error types.

use thiserror::Error;
use weft_core::ProviderKind;

/// Why a raw provider value could not be decoded.
///
/// Decode failures never reach the user: the caller logs them (debug for
/// unknown kinds, warn for everything else) and drops the frame.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The value is not a JSON object.
    #[error("provider event is not a JSON object")]
    NotAnObject,

    /// The `type` discriminator is missing or not a string.
    #[error("provider event has no string `type` field")]
    MissingType,

    /// The discriminator names an event kind this decoder does not know.
    #[error("unknown {provider} event type: {event_type}")]
    UnknownType {
        /// Decoding provider.
        provider: ProviderKind,
        /// The unrecognized discriminator.
        event_type: String,
    },

    /// A known event kind with a structurally invalid payload.
    #[error("malformed {provider} {event_type} event: {message}")]
    Malformed {
        /// Decoding provider.
        provider: ProviderKind,
        /// The event discriminator.
        event_type: String,
        /// Deserializer message.
        message: String,
    },

    /// A block-start for a content block kind with no mapping.
    #[error("unsupported {provider} content block type: {block_type}")]
    UnsupportedBlock {
        /// Decoding provider.
        provider: ProviderKind,
        /// The unrecognized block type.
        block_type: String,
    },
}

impl DecodeError {
    /// Whether the failure is an unrecognized kind rather than a broken payload.
    ///
    /// Unknown kinds are expected as providers add event types and log at
    /// debug; the rest log at warn.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::UnknownType { .. } | Self::UnsupportedBlock { .. })
    }

    pub(crate) fn malformed(
        provider: ProviderKind,
        event_type: &str,
        error: &impl std::fmt::Display,
    ) -> Self {
        Self::Malformed {
            provider,
            event_type: event_type.to_owned(),
            message: error.to_string(),
        }
    }
}

/// Failure of the byte transport feeding a session.
#[derive(Debug, Error)]
pub enum TransportError {
    /// I/O failure reading the stream.
    #[error("stream read failed: {0}")]
    Io(#[from] std::io::Error),

    /// The upstream closed the stream.
    #[error("stream closed by upstream")]
    Closed,

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}
