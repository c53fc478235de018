//! Session error types.

use weft_stream::TransportError;

/// Errors returned by session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A turn is already draining on this session.
    #[error("Session busy: {0}")]
    Busy(String),

    /// The byte transport failed mid-turn. The session is idle again.
    #[error("Transport failed for session {session_id}: {source}")]
    Transport {
        /// Session whose stream failed.
        session_id: String,
        /// Underlying transport failure.
        #[source]
        source: TransportError,
    },

    /// No session with this id is registered.
    #[error("Session not found: {0}")]
    NotFound(String),
}

impl SessionError {
    /// Whether the caller can retry the operation on the same session.
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Busy(_) | Self::Transport { .. } => true,
            Self::NotFound(_) => false,
        }
    }

    /// Error category string for logs.
    pub fn category(&self) -> &str {
        match self {
            Self::Busy(_) => "session_busy",
            Self::Transport { .. } => "transport",
            Self::NotFound(_) => "session_not_found",
        }
    }
}

/// Convenience result type for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;
