//! Data-stream line protocol for chat responses.
//!
//! Every part is one line: a type code, a colon, a JSON value and `\n`.
//!
//! | code | part                             |
//! |------|----------------------------------|
//! | `f`  | step start `{messageId}`         |
//! | `0`  | text delta (string)              |
//! | `g`  | reasoning delta (string)         |
//! | `9`  | tool call                        |
//! | `a`  | tool result                      |
//! | `e`  | step finish                      |
//! | `d`  | message finish                   |
//! | `3`  | error (string)                   |

use serde::Serialize;
use serde_json::{json, Value};

use crate::llm::TokenUsage;

/// Response header announcing the protocol version.
pub const DATA_STREAM_HEADER: &str = "x-vercel-ai-data-stream";
pub const DATA_STREAM_VERSION: &str = "v1";

#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UsagePart {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl From<TokenUsage> for UsagePart {
    fn from(usage: TokenUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataStreamPart {
    StartStep {
        message_id: String,
    },
    Text(String),
    Reasoning(String),
    ToolCall {
        tool_call_id: String,
        tool_name: String,
        args: Value,
    },
    ToolResult {
        tool_call_id: String,
        result: Value,
    },
    FinishStep {
        finish_reason: String,
        usage: UsagePart,
        is_continued: bool,
    },
    FinishMessage {
        finish_reason: String,
        usage: UsagePart,
    },
    Error(String),
}

impl DataStreamPart {
    pub fn code(&self) -> char {
        match self {
            DataStreamPart::StartStep { .. } => 'f',
            DataStreamPart::Text(_) => '0',
            DataStreamPart::Reasoning(_) => 'g',
            DataStreamPart::ToolCall { .. } => '9',
            DataStreamPart::ToolResult { .. } => 'a',
            DataStreamPart::FinishStep { .. } => 'e',
            DataStreamPart::FinishMessage { .. } => 'd',
            DataStreamPart::Error(_) => '3',
        }
    }

    fn value(&self) -> Value {
        match self {
            DataStreamPart::StartStep { message_id } => json!({ "messageId": message_id }),
            DataStreamPart::Text(text) | DataStreamPart::Reasoning(text) => json!(text),
            DataStreamPart::Error(message) => json!(message),
            DataStreamPart::ToolCall {
                tool_call_id,
                tool_name,
                args,
            } => json!({
                "toolCallId": tool_call_id,
                "toolName": tool_name,
                "args": args,
            }),
            DataStreamPart::ToolResult {
                tool_call_id,
                result,
            } => json!({ "toolCallId": tool_call_id, "result": result }),
            DataStreamPart::FinishStep {
                finish_reason,
                usage,
                is_continued,
            } => json!({
                "finishReason": finish_reason,
                "usage": usage,
                "isContinued": is_continued,
            }),
            DataStreamPart::FinishMessage {
                finish_reason,
                usage,
            } => json!({ "finishReason": finish_reason, "usage": usage }),
        }
    }

    /// The wire line, including the trailing newline.
    pub fn encode(&self) -> String {
        format!("{}:{}\n", self.code(), self.value())
    }
}

/// Map a provider finish reason onto the protocol's vocabulary.
pub fn normalize_finish_reason(reason: Option<&str>) -> String {
    match reason {
        Some("stop") => "stop",
        Some("length") => "length",
        Some("tool_calls") | Some("function_call") => "tool-calls",
        Some("content_filter") => "content-filter",
        Some(_) => "other",
        None => "unknown",
    }
    .to_string()
}

/// Parse one encoded line back into its code and JSON value.
pub fn decode_line(line: &str) -> Option<(char, Value)> {
    let (code, payload) = line.split_once(':')?;
    let mut chars = code.chars();
    let code = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    Some((code, serde_json::from_str(payload.trim_end()).ok()?))
}
