//! Index-addressed block state for one in-flight message.
//!
//! Indices are stream-local and reused by every message, so the accumulator
//! is cleared at each message boundary. At most one state exists per index.

use std::collections::HashMap;

use serde_json::{Value, json};
use weft_core::{BlockHeader, BlockKind, ContentValue, ProviderKind};

use crate::tool_parsing::{ToolCallContext, parse_tool_call_arguments};

/// Mutable state of one open content block.
#[derive(Clone, Debug, PartialEq)]
pub struct ContentBlockState {
    /// Embedded provider id, or `<messageId>:<index>`.
    pub stable_id: String,
    /// Stream-local position.
    pub index: usize,
    /// Header snapshot from block start.
    pub header: BlockHeader,
    buffer: String,
    signature: String,
}

impl ContentBlockState {
    /// Block kind.
    pub fn kind(&self) -> BlockKind {
        self.header.kind()
    }

    /// Everything appended so far.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Collected thinking signature, if any.
    pub fn signature(&self) -> Option<&str> {
        (!self.signature.is_empty()).then_some(self.signature.as_str())
    }
}

/// Index to block-state arena for one message.
#[derive(Debug, Default)]
pub struct BlockAccumulator {
    provider: Option<ProviderKind>,
    message_id: String,
    blocks: HashMap<usize, ContentBlockState>,
}

impl BlockAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an accumulator whose parse warnings name `provider`.
    pub fn for_provider(provider: ProviderKind) -> Self {
        Self {
            provider: Some(provider),
            ..Self::default()
        }
    }

    /// Drop every block and forget the current message.
    pub fn reset(&mut self) {
        self.blocks.clear();
        self.message_id.clear();
    }

    /// Reset for a new message whose fallback ids derive from `message_id`.
    pub fn begin(&mut self, message_id: &str) {
        self.reset();
        message_id.clone_into(&mut self.message_id);
    }

    /// Id of the current message (empty when none).
    pub fn message_id(&self) -> &str {
        &self.message_id
    }

    /// Open a block. An index that is already open is returned unchanged.
    pub fn open(&mut self, index: usize, header: BlockHeader) -> &ContentBlockState {
        let message_id = &self.message_id;
        self.blocks.entry(index).or_insert_with(|| {
            let stable_id = match header.embedded_id() {
                Some(id) => id.to_owned(),
                None if message_id.is_empty() => index.to_string(),
                None => format!("{message_id}:{index}"),
            };
            ContentBlockState {
                stable_id,
                index,
                header,
                buffer: String::new(),
                signature: String::new(),
            }
        })
    }

    /// Append text to an open block. Returns `None` if the index is not open.
    pub fn append(&mut self, index: usize, text: &str) -> Option<&ContentBlockState> {
        let state = self.blocks.get_mut(&index)?;
        state.buffer.push_str(text);
        Some(&*state)
    }

    /// Append to a thinking block's signature. Returns whether it applied.
    pub fn append_signature(&mut self, index: usize, text: &str) -> bool {
        match self.blocks.get_mut(&index) {
            Some(state) if state.kind() == BlockKind::Thinking => {
                state.signature.push_str(text);
                true
            }
            _ => false,
        }
    }

    /// State of an open block.
    pub fn get(&self, index: usize) -> Option<&ContentBlockState> {
        self.blocks.get(&index)
    }

    /// Remove and return an open block; `None` if absent or already closed.
    pub fn close(&mut self, index: usize) -> Option<ContentBlockState> {
        self.blocks.remove(&index)
    }

    /// Drop all open blocks without finalizing. Returns how many were dropped.
    pub fn discard(&mut self) -> usize {
        let dropped = self.blocks.len();
        self.blocks.clear();
        dropped
    }

    /// Whether `index` is open.
    pub fn is_open(&self, index: usize) -> bool {
        self.blocks.contains_key(&index)
    }

    /// Number of open blocks.
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether no block is open.
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Turn a closed block into its final content. Never fails: tool input
    /// that does not parse falls back to the header's input.
    pub fn finalize(&self, state: ContentBlockState) -> ContentValue {
        let ContentBlockState {
            stable_id,
            header,
            buffer,
            signature,
            ..
        } = state;

        match header {
            BlockHeader::Text { mut text } => {
                text.push_str(&buffer);
                ContentValue::Text { text }
            }
            BlockHeader::Thinking { mut thinking } => {
                thinking.push_str(&buffer);
                ContentValue::Thinking {
                    thinking,
                    signature: (!signature.is_empty()).then_some(signature),
                }
            }
            BlockHeader::ToolUse { id, name, input } => {
                let context = ToolCallContext {
                    tool_call_id: Some(&stable_id),
                    tool_name: Some(&name),
                    provider: self.provider,
                };
                let input = parse_tool_call_arguments(&buffer, &context).map_or(input, Value::Object);
                ContentValue::ToolUse { id, name, input }
            }
            BlockHeader::ToolResult {
                tool_use_id,
                content,
                is_error,
            } => ContentValue::ToolResult {
                tool_use_id,
                content: append_result_text(content, buffer),
                is_error,
            },
            BlockHeader::CommandExecution { id, command } => ContentValue::CommandExecution {
                id,
                command,
                output: buffer,
            },
        }
    }
}

fn append_result_text(content: Value, streamed: String) -> Value {
    if streamed.is_empty() {
        return content;
    }
    match content {
        Value::Null => Value::String(streamed),
        Value::String(mut text) => {
            text.push_str(&streamed);
            Value::String(text)
        }
        Value::Array(mut parts) => {
            parts.push(json!({"type": "text", "text": streamed}));
            Value::Array(parts)
        }
        other => Value::Array(vec![other, json!({"type": "text", "text": streamed})]),
    }
}
