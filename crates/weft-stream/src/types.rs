//! The shared shape every provider decoder lowers into.

use weft_core::BlockHeader;

use crate::claude::ClaudeUsage;
use crate::codex::CodexUsage;

/// One decoded provider event, lowered to the shared vocabulary.
#[derive(Clone, Debug, PartialEq)]
pub enum RawProviderEvent {
    /// A message began.
    MessageStart {
        /// Provider message id. `None` or blank fails the message.
        message_id: Option<String>,
        /// Blocks delivered inside the message start, with their indices.
        initial_blocks: Vec<(usize, BlockHeader)>,
        /// Usage known when the message opens (input and cache counters).
        usage: Option<ProviderUsage>,
    },
    /// A content block opened.
    ContentBlockStart {
        /// Stream-local block position.
        index: usize,
        /// Immutable header.
        header: BlockHeader,
    },
    /// A fragment for an open block.
    ContentBlockDelta {
        /// Stream-local block position.
        index: usize,
        /// Fragment.
        delta: RawDelta,
    },
    /// A block closed.
    ContentBlockStop {
        /// Stream-local block position.
        index: usize,
    },
    /// Message-level update, possibly carrying usage.
    MessageDelta {
        /// Usage reported before the terminal signal.
        usage: Option<ProviderUsage>,
    },
    /// The message finished streaming.
    MessageStop,
    /// Out-of-band terminal result of the turn.
    TurnResult {
        /// Whether the turn failed.
        is_error: bool,
        /// Result or error text.
        summary: Option<String>,
        /// Usage for the whole turn.
        usage: Option<ProviderUsage>,
    },
}

impl RawProviderEvent {
    /// Short name for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MessageStart { .. } => "message_start",
            Self::ContentBlockStart { .. } => "content_block_start",
            Self::ContentBlockDelta { .. } => "content_block_delta",
            Self::ContentBlockStop { .. } => "content_block_stop",
            Self::MessageDelta { .. } => "message_delta",
            Self::MessageStop => "message_stop",
            Self::TurnResult { .. } => "turn_result",
        }
    }
}

/// Fragment carried by a content block delta, before classification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawDelta {
    /// Assistant text.
    Text(String),
    /// Reasoning text.
    Thinking(String),
    /// Reasoning verification signature. Stored, never emitted.
    Signature(String),
    /// Partial tool call argument JSON.
    ToolArgs(String),
    /// Partial command output.
    CommandOutput(String),
    /// A delta kind with no mapping; carries the provider's delta type.
    Unrecognized(String),
}

/// Provider-specific token usage payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProviderUsage {
    /// Anthropic-style usage counters.
    Claude(ClaudeUsage),
    /// Responses-style usage counters.
    Codex(CodexUsage),
}

/// A decoded event plus the envelope's attribution fields.
#[derive(Clone, Debug, PartialEq)]
pub struct ProviderFrame {
    /// The decoded event.
    pub event: RawProviderEvent,
    /// Session id reported by the provider, if any.
    pub session_id: Option<String>,
    /// Owning tool call when the event comes from a sub-agent.
    pub parent_tool_use_id: Option<String>,
}

impl ProviderFrame {
    /// Frame with no envelope attribution.
    pub fn bare(event: RawProviderEvent) -> Self {
        Self {
            event,
            session_id: None,
            parent_tool_use_id: None,
        }
    }

    /// Attribute the frame to a sub-agent's parent tool call.
    #[must_use]
    pub fn with_parent(mut self, parent_tool_use_id: impl Into<String>) -> Self {
        self.parent_tool_use_id = Some(parent_tool_use_id.into());
        self
    }
}

impl From<RawProviderEvent> for ProviderFrame {
    fn from(event: RawProviderEvent) -> Self {
        Self::bare(event)
    }
}
