//! Lowers Claude stream events into [`RawProviderEvent`]s.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;
use weft_core::{BlockHeader, ProviderKind};

use super::types::{ContentBlock, Delta, ResultFrame, StreamEnvelope, StreamEvent};
use crate::decoder::{ProviderDecoder, event_type};
use crate::errors::DecodeError;
use crate::types::{ProviderFrame, ProviderUsage, RawDelta, RawProviderEvent};

const PROVIDER: ProviderKind = ProviderKind::Claude;

/// Decoder for Claude streams, bare or wrapped in the CLI `stream_event`
/// envelope.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClaudeDecoder;

impl ProviderDecoder for ClaudeDecoder {
    fn provider(&self) -> ProviderKind {
        PROVIDER
    }

    fn decode(&self, raw: &Value) -> Result<ProviderFrame, DecodeError> {
        match event_type(raw)? {
            "stream_event" => {
                let envelope = StreamEnvelope::deserialize(raw)
                    .map_err(|e| DecodeError::malformed(PROVIDER, "stream_event", &e))?;
                let event = decode_event(&envelope.event)?;
                Ok(ProviderFrame {
                    event,
                    session_id: non_blank(envelope.session_id),
                    parent_tool_use_id: non_blank(envelope.parent_tool_use_id),
                })
            }
            "result" => {
                let result = ResultFrame::deserialize(raw)
                    .map_err(|e| DecodeError::malformed(PROVIDER, "result", &e))?;
                let summary = if result.is_error {
                    result.result.or(result.subtype)
                } else {
                    result.result
                };
                Ok(ProviderFrame {
                    event: RawProviderEvent::TurnResult {
                        is_error: result.is_error,
                        summary,
                        usage: result.usage.map(ProviderUsage::Claude),
                    },
                    session_id: non_blank(result.session_id),
                    parent_tool_use_id: None,
                })
            }
            _ => decode_event(raw).map(ProviderFrame::bare),
        }
    }
}

fn decode_event(raw: &Value) -> Result<RawProviderEvent, DecodeError> {
    let event_type = event_type(raw)?;
    let event = StreamEvent::deserialize(raw)
        .map_err(|e| DecodeError::malformed(PROVIDER, event_type, &e))?;

    match event {
        StreamEvent::MessageStart { message } => {
            let initial_blocks = message
                .content
                .iter()
                .enumerate()
                .filter_map(|(index, block)| match lower_block(block) {
                    Ok(header) => Some((index, header)),
                    Err(error) => {
                        debug!(index, %error, "skipping front-loaded block");
                        None
                    }
                })
                .collect();
            Ok(RawProviderEvent::MessageStart {
                message_id: message.id,
                initial_blocks,
                usage: message.usage.map(ProviderUsage::Claude),
            })
        }
        StreamEvent::ContentBlockStart {
            index,
            content_block,
        } => Ok(RawProviderEvent::ContentBlockStart {
            index,
            header: lower_block(&content_block)?,
        }),
        StreamEvent::ContentBlockDelta { index, delta } => Ok(RawProviderEvent::ContentBlockDelta {
            index,
            delta: lower_delta(&delta)?,
        }),
        StreamEvent::ContentBlockStop { index } => Ok(RawProviderEvent::ContentBlockStop { index }),
        StreamEvent::MessageDelta { usage } => Ok(RawProviderEvent::MessageDelta {
            usage: usage.map(ProviderUsage::Claude),
        }),
        StreamEvent::MessageStop => Ok(RawProviderEvent::MessageStop),
        StreamEvent::Error { error } => Ok(RawProviderEvent::TurnResult {
            is_error: true,
            summary: error.message.or(error.kind),
            usage: None,
        }),
        StreamEvent::Unknown => Err(DecodeError::UnknownType {
            provider: PROVIDER,
            event_type: event_type.to_owned(),
        }),
    }
}

fn lower_block(raw: &Value) -> Result<BlockHeader, DecodeError> {
    let block = ContentBlock::deserialize(raw)
        .map_err(|e| DecodeError::malformed(PROVIDER, "content_block", &e))?;

    let header = match block {
        ContentBlock::Text { text } => BlockHeader::Text { text },
        ContentBlock::Thinking { thinking } => BlockHeader::Thinking { thinking },
        ContentBlock::RedactedThinking {} => BlockHeader::Thinking {
            thinking: String::new(),
        },
        ContentBlock::ToolUse { id, name, input } | ContentBlock::ServerToolUse { id, name, input } => {
            BlockHeader::ToolUse {
                id,
                name,
                input: object_or_empty(input),
            }
        }
        ContentBlock::ToolResult {
            tool_use_id,
            content,
            is_error,
        } => BlockHeader::ToolResult {
            tool_use_id,
            content,
            is_error,
        },
        ContentBlock::WebSearchToolResult {
            tool_use_id,
            content,
        } => BlockHeader::ToolResult {
            tool_use_id,
            content,
            is_error: false,
        },
        ContentBlock::Unknown => {
            return Err(DecodeError::UnsupportedBlock {
                provider: PROVIDER,
                block_type: type_name(raw),
            });
        }
    };
    Ok(header)
}

fn lower_delta(raw: &Value) -> Result<RawDelta, DecodeError> {
    let delta = Delta::deserialize(raw)
        .map_err(|e| DecodeError::malformed(PROVIDER, "content_block_delta", &e))?;

    Ok(match delta {
        Delta::TextDelta { text } => RawDelta::Text(text),
        Delta::ThinkingDelta { thinking } => RawDelta::Thinking(thinking),
        Delta::SignatureDelta { signature } => RawDelta::Signature(signature),
        Delta::InputJsonDelta { partial_json } => RawDelta::ToolArgs(partial_json),
        Delta::Unknown => RawDelta::Unrecognized(type_name(raw)),
    })
}

fn type_name(raw: &Value) -> String {
    raw.get("type")
        .and_then(Value::as_str)
        .unwrap_or("<untyped>")
        .to_owned()
}

fn object_or_empty(input: Value) -> Value {
    if input.is_null() {
        Value::Object(Map::new())
    } else {
        input
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
