//! Lowers Codex stream events into [`RawProviderEvent`]s.
//!
//! Blocks are addressed by `output_index`. Reasoning and reasoning-summary
//! deltas both feed the Thinking block at that index.

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use weft_core::{BlockHeader, ProviderKind};

use super::types::{OutputItem, ResponseObject, StreamEvent, TextPart};
use crate::decoder::{ProviderDecoder, event_type};
use crate::errors::DecodeError;
use crate::tool_parsing::{ToolCallContext, parse_or_empty};
use crate::types::{ProviderFrame, ProviderUsage, RawDelta, RawProviderEvent};

const PROVIDER: ProviderKind = ProviderKind::Codex;

/// Decoder for Codex Responses-style streams.
#[derive(Clone, Copy, Debug, Default)]
pub struct CodexDecoder;

impl ProviderDecoder for CodexDecoder {
    fn provider(&self) -> ProviderKind {
        PROVIDER
    }

    fn decode(&self, raw: &Value) -> Result<ProviderFrame, DecodeError> {
        let event_type = event_type(raw)?;
        let event = StreamEvent::deserialize(raw)
            .map_err(|e| DecodeError::malformed(PROVIDER, event_type, &e))?;
        lower_event(event, event_type).map(ProviderFrame::bare)
    }
}

fn lower_event(event: StreamEvent, event_type: &str) -> Result<RawProviderEvent, DecodeError> {
    let delta = |index: usize, delta: RawDelta| -> Result<RawProviderEvent, DecodeError> {
        Ok(RawProviderEvent::ContentBlockDelta { index, delta })
    };

    match event {
        StreamEvent::Created { response } => {
            let initial_blocks = response
                .output
                .iter()
                .enumerate()
                .filter_map(|(index, item)| match lower_item(item) {
                    Ok(header) => Some((index, header)),
                    Err(error) => {
                        debug!(index, %error, "skipping front-loaded output item");
                        None
                    }
                })
                .collect();
            Ok(RawProviderEvent::MessageStart {
                message_id: response.id,
                initial_blocks,
                usage: response.usage.map(ProviderUsage::Codex),
            })
        }
        StreamEvent::InProgress { response } => Ok(RawProviderEvent::MessageDelta {
            usage: response.usage.map(ProviderUsage::Codex),
        }),
        StreamEvent::OutputItemAdded { output_index, item } => {
            Ok(RawProviderEvent::ContentBlockStart {
                index: output_index,
                header: lower_item(&item)?,
            })
        }
        StreamEvent::OutputTextDelta {
            output_index,
            delta: text,
        } => delta(output_index, RawDelta::Text(text)),
        StreamEvent::ReasoningTextDelta {
            output_index,
            delta: text,
        }
        | StreamEvent::ReasoningSummaryTextDelta {
            output_index,
            delta: text,
        } => delta(output_index, RawDelta::Thinking(text)),
        StreamEvent::FunctionCallArgumentsDelta {
            output_index,
            delta: text,
        } => delta(output_index, RawDelta::ToolArgs(text)),
        StreamEvent::CommandOutputDelta {
            output_index,
            delta: text,
        } => delta(output_index, RawDelta::CommandOutput(text)),
        StreamEvent::OutputItemDone { output_index } => Ok(RawProviderEvent::ContentBlockStop {
            index: output_index,
        }),
        StreamEvent::Completed { response } => Ok(RawProviderEvent::TurnResult {
            is_error: false,
            summary: None,
            usage: response.usage.map(ProviderUsage::Codex),
        }),
        StreamEvent::Failed { response } => Ok(failed_turn(response)),
        StreamEvent::Error { code, message } => Ok(RawProviderEvent::TurnResult {
            is_error: true,
            summary: message.or(code),
            usage: None,
        }),
        StreamEvent::Unknown => Err(DecodeError::UnknownType {
            provider: PROVIDER,
            event_type: event_type.to_owned(),
        }),
    }
}

fn failed_turn(response: ResponseObject) -> RawProviderEvent {
    let summary = response
        .error
        .and_then(|e| e.message.or(e.code))
        .or_else(|| Some("response failed".to_owned()));
    RawProviderEvent::TurnResult {
        is_error: true,
        summary,
        usage: response.usage.map(ProviderUsage::Codex),
    }
}

fn lower_item(raw: &Value) -> Result<BlockHeader, DecodeError> {
    let item = OutputItem::deserialize(raw)
        .map_err(|e| DecodeError::malformed(PROVIDER, "output_item", &e))?;

    let header = match item {
        OutputItem::Message { content } => BlockHeader::Text {
            text: join_parts(&content),
        },
        OutputItem::Reasoning { summary } => BlockHeader::Thinking {
            thinking: join_parts(&summary),
        },
        OutputItem::FunctionCall {
            id,
            call_id,
            name,
            arguments,
        } => {
            let id = call_id.or(id);
            let input = parse_or_empty(
                &arguments,
                &ToolCallContext {
                    tool_call_id: id.as_deref(),
                    tool_name: Some(&name),
                    provider: Some(PROVIDER),
                },
            );
            BlockHeader::ToolUse { id, name, input }
        }
        OutputItem::LocalShellCall {
            id,
            call_id,
            action,
        } => BlockHeader::CommandExecution {
            id: call_id.or(id),
            command: action.map(|a| a.command.join(" ")).unwrap_or_default(),
        },
        OutputItem::CommandExecution { id, command } => {
            BlockHeader::CommandExecution { id, command }
        }
        OutputItem::FunctionCallOutput { call_id, output } => BlockHeader::ToolResult {
            tool_use_id: call_id,
            content: output,
            is_error: false,
        },
        OutputItem::Unknown => {
            return Err(DecodeError::UnsupportedBlock {
                provider: PROVIDER,
                block_type: raw
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("<untyped>")
                    .to_owned(),
            });
        }
    };
    Ok(header)
}

fn join_parts(parts: &[TextPart]) -> String {
    parts.iter().map(|p| p.text.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    fn event(raw: &Value) -> RawProviderEvent {
        CodexDecoder.decode(raw).unwrap().event
    }

    // ── lifecycle ───────────────────────────────────────────────────────

    #[test]
    fn created_is_message_start() {
        let raw = json!({"type": "response.created", "response": {"id": "resp_1", "output": []}});
        assert_eq!(
            event(&raw),
            RawProviderEvent::MessageStart {
                message_id: Some("resp_1".into()),
                initial_blocks: vec![],
                usage: None,
            }
        );
    }

    #[test]
    fn created_with_output_front_loads_blocks() {
        let raw = json!({"type": "response.created", "response": {"id": "resp_1", "output": [
            {"type": "message", "content": [{"type": "output_text", "text": "Hi"}]},
            {"type": "web_search_call", "id": "ws_1"},
            {"type": "function_call", "call_id": "call_1", "name": "shell", "arguments": "{\"cmd\":[\"ls\"]}"}
        ]}});
        let RawProviderEvent::MessageStart { initial_blocks, .. } = event(&raw) else {
            panic!("expected MessageStart");
        };
        assert_eq!(initial_blocks.len(), 2);
        assert_eq!(initial_blocks[0], (0, BlockHeader::Text { text: "Hi".into() }));
        assert_matches!(
            &initial_blocks[1],
            (2, BlockHeader::ToolUse { id: Some(id), input, .. }) if id == "call_1" && input["cmd"][0] == "ls"
        );
    }

    #[test]
    fn in_progress_without_usage() {
        let raw = json!({"type": "response.in_progress", "response": {"id": "resp_1"}});
        assert_eq!(event(&raw), RawProviderEvent::MessageDelta { usage: None });
    }

    #[test]
    fn completed_carries_usage() {
        let raw = json!({"type": "response.completed", "response": {
            "id": "resp_1",
            "usage": {"input_tokens": 100, "output_tokens": 20, "input_tokens_details": {"cached_tokens": 60}}
        }});
        let RawProviderEvent::TurnResult { is_error: false, usage: Some(ProviderUsage::Codex(usage)), .. } = event(&raw)
        else {
            panic!("expected successful TurnResult");
        };
        assert_eq!(usage.input_tokens, Some(100));
        assert_eq!(usage.input_tokens_details.and_then(|d| d.cached_tokens), Some(60));
    }

    #[test]
    fn failed_and_error_are_failed_turns() {
        let failed = json!({"type": "response.failed", "response": {
            "id": "resp_1", "error": {"code": "server_error", "message": "upstream exploded"}
        }});
        assert_matches!(
            event(&failed),
            RawProviderEvent::TurnResult { is_error: true, summary: Some(ref s), .. } if s == "upstream exploded"
        );

        let failed_no_detail = json!({"type": "response.failed", "response": {}});
        assert_matches!(
            event(&failed_no_detail),
            RawProviderEvent::TurnResult { is_error: true, summary: Some(_), .. }
        );

        let error = json!({"type": "error", "code": "rate_limit_exceeded"});
        assert_matches!(
            event(&error),
            RawProviderEvent::TurnResult { is_error: true, summary: Some(ref s), .. } if s == "rate_limit_exceeded"
        );
    }

    // ── items ───────────────────────────────────────────────────────────

    #[test]
    fn output_item_added_variants() {
        let cases = [
            (json!({"type": "message", "id": "msg_1", "content": []}), BlockHeader::Text { text: String::new() }),
            (
                json!({"type": "reasoning", "id": "rs_1", "summary": []}),
                BlockHeader::Thinking { thinking: String::new() },
            ),
            (
                json!({"type": "local_shell_call", "call_id": "call_9", "action": {"type": "exec", "command": ["bash", "-lc", "ls"]}}),
                BlockHeader::CommandExecution { id: Some("call_9".into()), command: "bash -lc ls".into() },
            ),
            (
                json!({"type": "command_execution", "id": "cmd_1", "command": "cargo fmt"}),
                BlockHeader::CommandExecution { id: Some("cmd_1".into()), command: "cargo fmt".into() },
            ),
            (
                json!({"type": "function_call_output", "call_id": "call_1", "output": "ok"}),
                BlockHeader::ToolResult { tool_use_id: Some("call_1".into()), content: json!("ok"), is_error: false },
            ),
        ];
        for (item, header) in cases {
            let raw = json!({"type": "response.output_item.added", "output_index": 3, "item": item});
            assert_eq!(event(&raw), RawProviderEvent::ContentBlockStart { index: 3, header });
        }
    }

    #[test]
    fn function_call_prefers_call_id() {
        let raw = json!({"type": "response.output_item.added", "output_index": 1, "item": {
            "type": "function_call", "id": "fc_1", "call_id": "call_1", "name": "apply_patch", "arguments": ""
        }});
        assert_eq!(
            event(&raw),
            RawProviderEvent::ContentBlockStart {
                index: 1,
                header: BlockHeader::ToolUse {
                    id: Some("call_1".into()),
                    name: "apply_patch".into(),
                    input: json!({}),
                },
            }
        );
    }

    #[test]
    fn unsupported_item() {
        let raw = json!({"type": "response.output_item.added", "output_index": 0, "item": {"type": "image_generation_call"}});
        assert_matches!(
            CodexDecoder.decode(&raw),
            Err(DecodeError::UnsupportedBlock { ref block_type, .. }) if block_type == "image_generation_call"
        );
    }

    // ── deltas ──────────────────────────────────────────────────────────

    #[test]
    fn deltas() {
        let cases = [
            ("response.output_text.delta", RawDelta::Text("x".into())),
            ("response.reasoning_text.delta", RawDelta::Thinking("x".into())),
            ("response.reasoning_summary_text.delta", RawDelta::Thinking("x".into())),
            ("response.function_call_arguments.delta", RawDelta::ToolArgs("x".into())),
            ("response.command_execution.output_delta", RawDelta::CommandOutput("x".into())),
        ];
        for (kind, expected) in cases {
            let raw = json!({"type": kind, "output_index": 4, "item_id": "it", "delta": "x"});
            assert_eq!(
                event(&raw),
                RawProviderEvent::ContentBlockDelta { index: 4, delta: expected },
                "{kind}"
            );
        }
    }

    #[test]
    fn output_item_done_is_stop() {
        let raw = json!({"type": "response.output_item.done", "output_index": 2, "item": {"type": "message"}});
        assert_eq!(event(&raw), RawProviderEvent::ContentBlockStop { index: 2 });
    }

    // ── failures ────────────────────────────────────────────────────────

    #[test]
    fn unknown_and_malformed() {
        assert_matches!(
            CodexDecoder.decode(&json!({"type": "response.output_text.done", "output_index": 0})),
            Err(DecodeError::UnknownType { .. })
        );
        assert_matches!(
            CodexDecoder.decode(&json!({"type": "response.output_text.delta", "delta": "x"})),
            Err(DecodeError::Malformed { .. })
        );
    }
}
