//! # Tool Call Argument Parsing
//!
//! Streamed tool arguments arrive as JSON fragments and are only parsed once
//! the block closes. Parsing fails open: an empty, malformed or non-object
//! buffer yields `None` and the caller keeps the last known-good input.

use serde_json::{Map, Value};
use tracing::warn;
use weft_core::ProviderKind;
use weft_core::text::truncate_str;

/// Context attached to warnings when argument parsing fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct ToolCallContext<'a> {
    /// The tool call id.
    pub tool_call_id: Option<&'a str>,
    /// The tool name.
    pub tool_name: Option<&'a str>,
    /// The provider that generated the call.
    pub provider: Option<ProviderKind>,
}

/// Parse a tool call argument string into a JSON object.
///
/// Returns `None` without logging for blank input, and `None` with a warning
/// for invalid JSON or JSON that is not an object.
pub fn parse_tool_call_arguments(
    args: &str,
    context: &ToolCallContext<'_>,
) -> Option<Map<String, Value>> {
    let trimmed = args.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => Some(map),
        Ok(other) => {
            warn!(
                tool_call_id = context.tool_call_id,
                tool_name = context.tool_name,
                provider = context.provider.map(ProviderKind::as_str),
                parsed_type = truncate_str(&other.to_string(), 20),
                "tool call arguments parsed as non-object, using fallback input"
            );
            None
        }
        Err(e) => {
            warn!(
                tool_call_id = context.tool_call_id,
                tool_name = context.tool_name,
                provider = context.provider.map(ProviderKind::as_str),
                error = %e,
                args_preview = truncate_str(trimmed, 100),
                "failed to parse tool call arguments, using fallback input"
            );
            None
        }
    }
}

/// Parse arguments, falling back to an empty object.
pub fn parse_or_empty(args: &str, context: &ToolCallContext<'_>) -> Value {
    Value::Object(parse_tool_call_arguments(args, context).unwrap_or_default())
}
