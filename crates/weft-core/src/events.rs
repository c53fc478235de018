//! Event types for stream normalization and presentation.
//!
//! Two event families:
//!
//! - **[`NormalizedEvent`]**: provider-agnostic events produced by the stream
//!   normalizer from decoded provider frames (message boundaries, block
//!   start/delta/complete, turn outcome).
//! - **[`UiEvent`]**: presentation events produced by the UI projector and
//!   pushed to renderer subscriptions.
//!
//! Both are ephemeral: consumed immediately, never persisted.

use serde::{Deserialize, Serialize};

use crate::content::{BlockHeader, BlockKind, ContentValue, DeltaPayload};
use crate::usage::Usage;

// ─────────────────────────────────────────────────────────────────────────────
// NormalizedEvent
// ─────────────────────────────────────────────────────────────────────────────

/// Provider-agnostic stream event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum NormalizedEvent {
    /// A new message began. Indices from earlier messages are void from here on.
    MessageStarted {
        /// Provider message id.
        message_id: String,
        /// Session the message belongs to.
        session_id: String,
        /// Headers of blocks the provider front-loaded into the message start.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        initial_content: Option<Vec<BlockHeader>>,
    },

    /// A content block opened at `index`.
    ContentStarted {
        /// Stable block id.
        id: String,
        /// Block kind.
        content_type: BlockKind,
        /// Tool name for tool-like blocks.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_name: Option<String>,
        /// Owning tool call when the block comes from a sub-agent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<String>,
        /// Stream-local position of the block.
        index: usize,
        /// Header snapshot taken at block start.
        header: BlockHeader,
    },

    /// A typed fragment was appended to the block at `index`.
    ContentDelta {
        /// Stable block id.
        id: String,
        /// Stream-local position of the block.
        index: usize,
        /// Typed fragment.
        payload: DeltaPayload,
        /// Owning tool call when the block comes from a sub-agent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<String>,
    },

    /// The block at `index` closed and finalized.
    ContentCompleted {
        /// Stable block id.
        id: String,
        /// Stream-local position of the block.
        index: usize,
        /// Finalized content.
        content: ContentValue,
        /// Owning tool call when the block comes from a sub-agent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<String>,
    },

    /// Turn (or message-level usage report) completed. May arrive twice per turn.
    TurnCompleted {
        /// Unified usage, when the provider reported any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<Usage>,
    },

    /// Turn or message failed.
    TurnFailed {
        /// Human-readable failure.
        error: String,
    },

    /// Turn was cancelled by the caller. Not an error.
    TurnCancelled,
}

impl NormalizedEvent {
    /// Wire name of the event variant.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::MessageStarted { .. } => "message_started",
            Self::ContentStarted { .. } => "content_started",
            Self::ContentDelta { .. } => "content_delta",
            Self::ContentCompleted { .. } => "content_completed",
            Self::TurnCompleted { .. } => "turn_completed",
            Self::TurnFailed { .. } => "turn_failed",
            Self::TurnCancelled => "turn_cancelled",
        }
    }

    /// Block index carried by content events.
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::ContentStarted { index, .. }
            | Self::ContentDelta { index, .. }
            | Self::ContentCompleted { index, .. } => Some(*index),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// UiEvent
// ─────────────────────────────────────────────────────────────────────────────

/// How a tool-like block is presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolType {
    /// Named tool invocation.
    Tool,
    /// Tool result block.
    ToolResult,
    /// Shell command execution.
    Command,
}

impl ToolType {
    /// Presentation type for a block kind; `None` for prose blocks.
    pub fn from_kind(kind: BlockKind) -> Option<Self> {
        match kind {
            BlockKind::ToolUse => Some(Self::Tool),
            BlockKind::ToolResult => Some(Self::ToolResult),
            BlockKind::CommandExecution => Some(Self::Command),
            BlockKind::Text | BlockKind::Thinking => None,
        }
    }
}

/// Presentation event pushed to renderer subscriptions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum UiEvent {
    /// A new assistant message began.
    MessageStart {
        /// Provider message id.
        message_id: String,
        /// Session id.
        session_id: String,
    },

    /// A text block opened.
    TextStart {
        /// Block index.
        index: usize,
        /// Owning tool call for sub-agent output.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<String>,
    },

    /// A reasoning block opened.
    ThinkingStart {
        /// Block index.
        index: usize,
        /// Owning tool call for sub-agent output.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<String>,
    },

    /// Text fragment.
    TextDelta {
        /// Block index.
        index: usize,
        /// Fragment.
        text: String,
        /// Owning tool call for sub-agent output.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<String>,
    },

    /// Reasoning fragment.
    ThinkingDelta {
        /// Block index.
        index: usize,
        /// Fragment.
        text: String,
        /// Owning tool call for sub-agent output.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<String>,
    },

    /// A tool or command started.
    ToolStart {
        /// Stable tool id used by every later event for this tool.
        tool_id: String,
        /// Tool name.
        tool_name: String,
        /// Presentation type.
        tool_type: ToolType,
        /// Owning tool call for sub-agent output.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<String>,
    },

    /// Argument or output fragment for a running tool.
    ToolProgress {
        /// Tool id.
        tool_id: String,
        /// Fragment preview (truncated).
        output_preview: String,
        /// Owning tool call for sub-agent output.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<String>,
    },

    /// A tool finished, or was closed by cancellation.
    ToolComplete {
        /// Tool id.
        tool_id: String,
        /// Finalized content; absent when the tool was interrupted.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        result: Option<ContentValue>,
        /// Set when the tool was closed by cancellation.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        interrupted: bool,
        /// Owning tool call for sub-agent output.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        parent_tool_use_id: Option<String>,
    },

    /// The message (or turn) completed.
    MessageComplete {
        /// Unified usage, when reported.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        usage: Option<Usage>,
    },

    /// The message or turn failed.
    Error {
        /// Human-readable failure.
        message: String,
    },

    /// The turn was cancelled by the caller.
    TurnCancelled,
}

impl UiEvent {
    /// Wire name of the event variant.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::MessageStart { .. } => "message_start",
            Self::TextStart { .. } => "text_start",
            Self::ThinkingStart { .. } => "thinking_start",
            Self::TextDelta { .. } => "text_delta",
            Self::ThinkingDelta { .. } => "thinking_delta",
            Self::ToolStart { .. } => "tool_start",
            Self::ToolProgress { .. } => "tool_progress",
            Self::ToolComplete { .. } => "tool_complete",
            Self::MessageComplete { .. } => "message_complete",
            Self::Error { .. } => "error",
            Self::TurnCancelled => "turn_cancelled",
        }
    }

    /// Whether the event ends a turn from the renderer's point of view.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::MessageComplete { .. } | Self::Error { .. } | Self::TurnCancelled
        )
    }
}
