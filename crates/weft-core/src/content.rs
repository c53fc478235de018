//! Content block vocabulary.
//!
//! A *block* is one logical unit of streamed content. Providers announce a
//! block with a header (immutable for the block's lifetime), stream typed
//! delta fragments into it, and close it; the closed block finalizes into a
//! [`ContentValue`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool name reported for command-execution blocks, which carry a command
/// line instead of a named tool.
pub const COMMAND_TOOL_NAME: &str = "shell";

/// Kind of a content block.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    /// Assistant text.
    Text,
    /// Reasoning trace.
    Thinking,
    /// Tool invocation with JSON arguments.
    ToolUse,
    /// Result returned for an earlier tool invocation.
    ToolResult,
    /// Shell command run by the agent, with streamed output.
    CommandExecution,
}

impl BlockKind {
    /// Whether the block is presented as a tool (start/progress/complete)
    /// rather than as streamed prose.
    pub fn is_tool_like(self) -> bool {
        matches!(
            self,
            Self::ToolUse | Self::ToolResult | Self::CommandExecution
        )
    }

    /// Wire name of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Thinking => "thinking",
            Self::ToolUse => "tool_use",
            Self::ToolResult => "tool_result",
            Self::CommandExecution => "command_execution",
        }
    }
}

/// Snapshot of a block taken when it starts. Never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum BlockHeader {
    /// Text block, possibly front-loaded with initial text.
    Text {
        /// Text already present when the block started.
        #[serde(default)]
        text: String,
    },
    /// Reasoning block, possibly front-loaded.
    Thinking {
        /// Reasoning already present when the block started.
        #[serde(default)]
        thinking: String,
    },
    /// Tool invocation.
    ToolUse {
        /// Provider-assigned tool call id, when known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Tool name.
        name: String,
        /// Last known-good structured input (used when streamed arguments
        /// fail to parse).
        #[serde(default)]
        input: Value,
    },
    /// Tool result.
    ToolResult {
        /// Id of the tool call this result answers.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_use_id: Option<String>,
        /// Result content as delivered at block start.
        #[serde(default)]
        content: Value,
        /// Whether the tool reported failure.
        #[serde(default)]
        is_error: bool,
    },
    /// Command execution.
    CommandExecution {
        /// Provider-assigned call id, when known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Command line being executed.
        #[serde(default)]
        command: String,
    },
}

impl BlockHeader {
    /// Kind of block this header starts.
    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Text { .. } => BlockKind::Text,
            Self::Thinking { .. } => BlockKind::Thinking,
            Self::ToolUse { .. } => BlockKind::ToolUse,
            Self::ToolResult { .. } => BlockKind::ToolResult,
            Self::CommandExecution { .. } => BlockKind::CommandExecution,
        }
    }

    /// Stable id embedded in the header by the provider, if any.
    ///
    /// For tool results this is the id of the tool call being answered.
    pub fn embedded_id(&self) -> Option<&str> {
        let id = match self {
            Self::ToolUse { id, .. } | Self::CommandExecution { id, .. } => id.as_deref(),
            Self::ToolResult { tool_use_id, .. } => tool_use_id.as_deref(),
            Self::Text { .. } | Self::Thinking { .. } => None,
        };
        id.filter(|s| !s.trim().is_empty())
    }

    /// Tool name presented for tool-like blocks.
    pub fn tool_name(&self) -> Option<&str> {
        match self {
            Self::ToolUse { name, .. } => Some(name.as_str()),
            Self::CommandExecution { .. } => Some(COMMAND_TOOL_NAME),
            Self::Text { .. } | Self::Thinking { .. } | Self::ToolResult { .. } => None,
        }
    }

    /// Prose present at block start, for front-loaded text and thinking blocks.
    pub fn initial_text(&self) -> Option<&str> {
        let text = match self {
            Self::Text { text } => text.as_str(),
            Self::Thinking { thinking } => thinking.as_str(),
            _ => return None,
        };
        (!text.is_empty()).then_some(text)
    }
}

/// Typed fragment carried by a content delta.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum DeltaPayload {
    /// Assistant text fragment.
    TextDelta(String),
    /// Reasoning fragment.
    ThinkingDelta(String),
    /// Partial JSON of tool call arguments.
    ToolArgFragment(String),
    /// Partial output of a running command.
    CommandOutputFragment(String),
}

impl DeltaPayload {
    /// Fragment text, regardless of payload kind.
    pub fn text(&self) -> &str {
        match self {
            Self::TextDelta(t)
            | Self::ThinkingDelta(t)
            | Self::ToolArgFragment(t)
            | Self::CommandOutputFragment(t) => t,
        }
    }

    /// Whether the fragment belongs to a tool-like block.
    pub fn is_tool_progress(&self) -> bool {
        matches!(
            self,
            Self::ToolArgFragment(_) | Self::CommandOutputFragment(_)
        )
    }
}

/// Finalized content of a closed block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ContentValue {
    /// Complete assistant text.
    Text {
        /// Full text.
        text: String,
    },
    /// Complete reasoning trace.
    Thinking {
        /// Full reasoning text.
        thinking: String,
        /// Verification signature collected from signature deltas.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signature: Option<String>,
    },
    /// Complete tool invocation.
    ToolUse {
        /// Tool call id, when known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Tool name.
        name: String,
        /// Parsed arguments (or the header's known-good input).
        input: Value,
    },
    /// Complete tool result.
    ToolResult {
        /// Id of the answered tool call.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tool_use_id: Option<String>,
        /// Result content.
        content: Value,
        /// Whether the tool reported failure.
        #[serde(default)]
        is_error: bool,
    },
    /// Complete command execution.
    CommandExecution {
        /// Call id, when known.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<String>,
        /// Command line.
        command: String,
        /// Collected output.
        output: String,
    },
}

impl ContentValue {
    /// Kind of block this value came from.
    pub fn kind(&self) -> BlockKind {
        match self {
            Self::Text { .. } => BlockKind::Text,
            Self::Thinking { .. } => BlockKind::Thinking,
            Self::ToolUse { .. } => BlockKind::ToolUse,
            Self::ToolResult { .. } => BlockKind::ToolResult,
            Self::CommandExecution { .. } => BlockKind::CommandExecution,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ── BlockHeader ─────────────────────────────────────────────────────

    #[test]
    fn embedded_id_prefers_provider_ids() {
        let tool = BlockHeader::ToolUse {
            id: Some("toolu_01".into()),
            name: "Bash".into(),
            input: json!({}),
        };
        assert_eq!(tool.embedded_id(), Some("toolu_01"));

        let result = BlockHeader::ToolResult {
            tool_use_id: Some("toolu_01".into()),
            content: Value::Null,
            is_error: false,
        };
        assert_eq!(result.embedded_id(), Some("toolu_01"));
    }

    #[test]
    fn blank_embedded_id_is_unknown() {
        let tool = BlockHeader::ToolUse {
            id: Some("  ".into()),
            name: "Bash".into(),
            input: json!({}),
        };
        assert_eq!(tool.embedded_id(), None);
        assert_eq!(BlockHeader::Text { text: String::new() }.embedded_id(), None);
    }

    #[test]
    fn tool_names() {
        let cmd = BlockHeader::CommandExecution {
            id: None,
            command: "ls -la".into(),
        };
        assert_eq!(cmd.tool_name(), Some(COMMAND_TOOL_NAME));
        assert_eq!(
            BlockHeader::Thinking {
                thinking: String::new()
            }
            .tool_name(),
            None
        );
    }

    #[test]
    fn initial_text_ignores_empty() {
        assert_eq!(BlockHeader::Text { text: String::new() }.initial_text(), None);
        assert_eq!(
            BlockHeader::Text { text: "Hi".into() }.initial_text(),
            Some("Hi")
        );
    }

    #[test]
    fn header_kind_matches_tool_like() {
        assert!(BlockKind::ToolUse.is_tool_like());
        assert!(BlockKind::ToolResult.is_tool_like());
        assert!(BlockKind::CommandExecution.is_tool_like());
        assert!(!BlockKind::Text.is_tool_like());
        assert!(!BlockKind::Thinking.is_tool_like());
    }

    // ── Serialization ───────────────────────────────────────────────────

    #[test]
    fn content_value_wire_shape() {
        let value = ContentValue::ToolResult {
            tool_use_id: Some("toolu_9".into()),
            content: json!("ok"),
            is_error: false,
        };
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["type"], "tool_result");
        assert_eq!(json["toolUseId"], "toolu_9");
        assert_eq!(json["isError"], false);
    }

    #[test]
    fn delta_payload_wire_shape() {
        let json = serde_json::to_value(DeltaPayload::ToolArgFragment("{\"a\"".into())).unwrap();
        assert_eq!(json["kind"], "tool_arg_fragment");
        assert_eq!(json["text"], "{\"a\"");
    }

    #[test]
    fn delta_payload_progress_classification() {
        assert!(DeltaPayload::CommandOutputFragment("x".into()).is_tool_progress());
        assert!(!DeltaPayload::TextDelta("x".into()).is_tool_progress());
        assert_eq!(DeltaPayload::ThinkingDelta("hmm".into()).text(), "hmm");
    }
}
