//! Codex (Responses-style) wire types.

use serde::Deserialize;
use serde_json::Value;

/// Responses streaming event.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub(crate) enum StreamEvent {
    #[serde(rename = "response.created")]
    Created { response: ResponseObject },
    #[serde(rename = "response.in_progress")]
    InProgress { response: ResponseObject },
    #[serde(rename = "response.output_item.added")]
    OutputItemAdded { output_index: usize, item: Value },
    #[serde(rename = "response.output_text.delta")]
    OutputTextDelta { output_index: usize, delta: String },
    #[serde(rename = "response.reasoning_text.delta")]
    ReasoningTextDelta { output_index: usize, delta: String },
    #[serde(rename = "response.reasoning_summary_text.delta")]
    ReasoningSummaryTextDelta { output_index: usize, delta: String },
    #[serde(rename = "response.function_call_arguments.delta")]
    FunctionCallArgumentsDelta { output_index: usize, delta: String },
    #[serde(rename = "response.command_execution.output_delta")]
    CommandOutputDelta { output_index: usize, delta: String },
    #[serde(rename = "response.output_item.done")]
    OutputItemDone { output_index: usize },
    #[serde(rename = "response.completed")]
    Completed { response: ResponseObject },
    #[serde(rename = "response.failed")]
    Failed { response: ResponseObject },
    #[serde(rename = "error")]
    Error {
        #[serde(default)]
        code: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

/// The `response` object carried by lifecycle events.
#[derive(Debug, Deserialize)]
pub(crate) struct ResponseObject {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub output: Vec<Value>,
    #[serde(default)]
    pub usage: Option<CodexUsage>,
    #[serde(default)]
    pub error: Option<ResponseError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ResponseError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Output item.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum OutputItem {
    Message {
        #[serde(default)]
        content: Vec<TextPart>,
    },
    Reasoning {
        #[serde(default)]
        summary: Vec<TextPart>,
    },
    FunctionCall {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        call_id: Option<String>,
        name: String,
        #[serde(default)]
        arguments: String,
    },
    LocalShellCall {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        call_id: Option<String>,
        #[serde(default)]
        action: Option<ShellAction>,
    },
    CommandExecution {
        #[serde(default)]
        id: Option<String>,
        #[serde(default)]
        command: String,
    },
    FunctionCallOutput {
        #[serde(default)]
        call_id: Option<String>,
        #[serde(default)]
        output: Value,
    },
    #[serde(other)]
    Unknown,
}

/// Text-bearing part of a message or reasoning item (`output_text`,
/// `summary_text`, ...).
#[derive(Debug, Deserialize)]
pub(crate) struct TextPart {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ShellAction {
    #[serde(default)]
    pub command: Vec<String>,
}

/// Responses-style token usage counters.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct CodexUsage {
    /// Input tokens, including cached ones.
    #[serde(default)]
    pub input_tokens: Option<u64>,
    /// Generated tokens.
    #[serde(default)]
    pub output_tokens: Option<u64>,
    /// Nested input breakdown.
    #[serde(default)]
    pub input_tokens_details: Option<InputTokensDetails>,
    /// Flat cached-input counter used by some event producers.
    #[serde(default)]
    pub cached_input_tokens: Option<u64>,
}

/// Breakdown of input tokens.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct InputTokensDetails {
    /// Input tokens served from cache.
    #[serde(default)]
    pub cached_tokens: Option<u64>,
}
