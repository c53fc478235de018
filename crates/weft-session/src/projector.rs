//! # UI Projector
//!
//! Maps [`NormalizedEvent`]s to presentation [`UiEvent`]s.
//!
//! Keeps two message-scoped correlation maps (block index to tool id, block
//! index to parent tool use id), cleared on every `MessageStarted` because
//! indices are reused across messages. Also tracks tools that have a
//! `UiToolStart` but no `UiToolComplete` yet, so cancellation can close them.

use std::collections::HashMap;

use tracing::debug;
use weft_core::text::truncate_chars;
use weft_core::{BlockKind, ContentValue, DeltaPayload, NormalizedEvent, ToolType, UiEvent};

/// Default tool progress preview length, in characters.
pub const DEFAULT_PREVIEW_CHARS: usize = 200;

/// Stateful projector for one session.
#[derive(Debug)]
pub struct UiProjector {
    preview_chars: usize,
    index_to_tool_id: HashMap<usize, String>,
    index_to_parent: HashMap<usize, String>,
    /// Started tools without a completion, in start order.
    open_tools: Vec<OpenTool>,
}

#[derive(Clone, Debug)]
struct OpenTool {
    tool_id: String,
    parent_tool_use_id: Option<String>,
}

impl Default for UiProjector {
    fn default() -> Self {
        Self::new(DEFAULT_PREVIEW_CHARS)
    }
}

impl UiProjector {
    /// Create a projector truncating tool progress to `preview_chars`.
    pub fn new(preview_chars: usize) -> Self {
        Self {
            preview_chars: preview_chars.max(1),
            index_to_tool_id: HashMap::new(),
            index_to_parent: HashMap::new(),
            open_tools: Vec::new(),
        }
    }

    /// Tool id recorded for a block index in the current message.
    pub fn tool_id_for(&self, index: usize) -> Option<&str> {
        self.index_to_tool_id.get(&index).map(String::as_str)
    }

    /// Ids of tools started but not yet completed, in start order.
    pub fn open_tool_ids(&self) -> Vec<&str> {
        self.open_tools.iter().map(|t| t.tool_id.as_str()).collect()
    }

    /// Drop all state at a turn boundary.
    pub fn reset(&mut self) {
        if !self.open_tools.is_empty() {
            debug!(open = self.open_tools.len(), "turn ended with tools still open");
        }
        self.index_to_tool_id.clear();
        self.index_to_parent.clear();
        self.open_tools.clear();
    }

    /// Project one normalized event into zero or more UI events.
    pub fn project(&mut self, event: &NormalizedEvent) -> Vec<UiEvent> {
        match event {
            NormalizedEvent::MessageStarted {
                message_id,
                session_id,
                ..
            } => {
                self.index_to_tool_id.clear();
                self.index_to_parent.clear();
                // blocks still open from the previous message were discarded
                let mut events = self.interrupt_open_tools();
                events.push(UiEvent::MessageStart {
                    message_id: message_id.clone(),
                    session_id: session_id.clone(),
                });
                events
            }

            NormalizedEvent::ContentStarted {
                content_type,
                tool_name,
                parent_tool_use_id,
                index,
                header,
                ..
            } => {
                let index = *index;
                match parent_tool_use_id {
                    Some(parent) => {
                        let _ = self.index_to_parent.insert(index, parent.clone());
                    }
                    None => {
                        let _ = self.index_to_parent.remove(&index);
                    }
                }
                let parent_tool_use_id = parent_tool_use_id.clone();

                let Some(tool_type) = ToolType::from_kind(*content_type) else {
                    return if *content_type == BlockKind::Thinking {
                        vec![UiEvent::ThinkingStart {
                            index,
                            parent_tool_use_id,
                        }]
                    } else {
                        vec![UiEvent::TextStart {
                            index,
                            parent_tool_use_id,
                        }]
                    };
                };

                let tool_id = header
                    .embedded_id()
                    .map_or_else(|| index.to_string(), str::to_owned);
                let _ = self.index_to_tool_id.insert(index, tool_id.clone());

                // a result answers a call that already has its own start
                if tool_type == ToolType::ToolResult {
                    return vec![];
                }

                self.open_tools.push(OpenTool {
                    tool_id: tool_id.clone(),
                    parent_tool_use_id: parent_tool_use_id.clone(),
                });
                vec![UiEvent::ToolStart {
                    tool_id,
                    tool_name: tool_name
                        .clone()
                        .or_else(|| header.tool_name().map(str::to_owned))
                        .unwrap_or_default(),
                    tool_type,
                    parent_tool_use_id,
                }]
            }

            NormalizedEvent::ContentDelta {
                index,
                payload,
                parent_tool_use_id,
                ..
            } => {
                let parent_tool_use_id = self.resolve_parent(*index, parent_tool_use_id.as_ref());
                match payload {
                    DeltaPayload::TextDelta(text) => vec![UiEvent::TextDelta {
                        index: *index,
                        text: text.clone(),
                        parent_tool_use_id,
                    }],
                    DeltaPayload::ThinkingDelta(text) => vec![UiEvent::ThinkingDelta {
                        index: *index,
                        text: text.clone(),
                        parent_tool_use_id,
                    }],
                    DeltaPayload::ToolArgFragment(text)
                    | DeltaPayload::CommandOutputFragment(text) => {
                        vec![UiEvent::ToolProgress {
                            tool_id: self.resolve_tool_id(*index),
                            output_preview: truncate_chars(text, self.preview_chars).to_owned(),
                            parent_tool_use_id,
                        }]
                    }
                }
            }

            NormalizedEvent::ContentCompleted {
                index,
                content,
                parent_tool_use_id,
                ..
            } => {
                if matches!(content, ContentValue::Text { .. } | ContentValue::Thinking { .. }) {
                    return vec![];
                }
                let tool_id = self.resolve_tool_id(*index);
                let parent_tool_use_id = self.resolve_parent(*index, parent_tool_use_id.as_ref());
                if let Some(pos) = self.open_tools.iter().position(|t| t.tool_id == tool_id) {
                    let _ = self.open_tools.remove(pos);
                }
                vec![UiEvent::ToolComplete {
                    tool_id,
                    result: Some(content.clone()),
                    interrupted: false,
                    parent_tool_use_id,
                }]
            }

            NormalizedEvent::TurnCompleted { usage } => {
                vec![UiEvent::MessageComplete {
                    usage: usage.clone(),
                }]
            }

            NormalizedEvent::TurnFailed { error } => {
                self.open_tools.clear();
                vec![UiEvent::Error {
                    message: error.clone(),
                }]
            }

            NormalizedEvent::TurnCancelled => {
                let mut events = self.interrupt_open_tools();
                events.push(UiEvent::TurnCancelled);
                events
            }
        }
    }

    /// Close every started tool that has no completion yet, in start order.
    ///
    /// Each gets an interrupted `UiToolComplete` with no result.
    pub fn interrupt_open_tools(&mut self) -> Vec<UiEvent> {
        self.open_tools
            .drain(..)
            .map(|tool| UiEvent::ToolComplete {
                tool_id: tool.tool_id,
                result: None,
                interrupted: true,
                parent_tool_use_id: tool.parent_tool_use_id,
            })
            .collect()
    }

    fn resolve_tool_id(&self, index: usize) -> String {
        self.index_to_tool_id
            .get(&index)
            .cloned()
            .unwrap_or_else(|| index.to_string())
    }

    /// The event's own parent wins over the recorded one.
    fn resolve_parent(&self, index: usize, own: Option<&String>) -> Option<String> {
        own.or_else(|| self.index_to_parent.get(&index)).cloned()
    }
}
