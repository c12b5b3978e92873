//! Server-sent event decoding for OpenAI-compatible streaming completions.
//!
//! `SseDecoder` splits the raw byte stream into `data:` payloads.
//! `DeltaAccumulator` turns payload chunks into [`StreamEvent`]s, assembling
//! tool calls whose arguments arrive in fragments.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::{LlmError, StreamEvent, TokenUsage, ToolCall};

/// Payload that terminates an OpenAI-style stream.
const DONE_MARKER: &str = "[DONE]";

/// Incremental SSE framing.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes and return the data of every event completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.buffer
            .extend(bytes.iter().copied().filter(|b| *b != b'\r'));

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let raw: Vec<u8> = self.buffer.drain(..pos + 2).collect();
            if let Some(data) = event_data(&String::from_utf8_lossy(&raw[..pos])) {
                events.push(data);
            }
        }
        events
    }

    /// Data of a trailing event that was not followed by a blank line.
    pub fn finish(&mut self) -> Option<String> {
        let raw = std::mem::take(&mut self.buffer);
        event_data(&String::from_utf8_lossy(&raw))
    }
}

/// Join the `data:` lines of one event. Comments and other fields are ignored.
fn event_data(event: &str) -> Option<String> {
    let lines: Vec<&str> = event
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(|data| data.strip_prefix(' ').unwrap_or(data))
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// One `chat.completion.chunk` object.
#[derive(Debug, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    choices: Vec<ChunkChoice>,
    #[serde(default)]
    usage: Option<ChunkUsage>,
    /// Groq reports usage on the final chunk under `x_groq`.
    #[serde(default)]
    x_groq: Option<GroqExtension>,
    /// Set when the provider aborts the stream, e.g. `tool_use_failed`.
    #[serde(default)]
    error: Option<ChunkError>,
}

#[derive(Debug, Deserialize)]
struct ChunkError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkChoice {
    #[serde(default)]
    delta: ChunkDelta,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChunkDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    reasoning: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCallDelta>>,
}

#[derive(Debug, Deserialize)]
struct ToolCallDelta {
    #[serde(default)]
    index: usize,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<FunctionDelta>,
}

#[derive(Debug, Deserialize)]
struct FunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct ChunkUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Deserialize)]
struct GroqExtension {
    #[serde(default)]
    usage: Option<ChunkUsage>,
}

#[derive(Debug, Default)]
struct PartialToolCall {
    id: Option<String>,
    name: String,
    arguments: String,
}

/// Stateful conversion of chunks into stream events.
#[derive(Debug, Default)]
pub struct DeltaAccumulator {
    tool_calls: BTreeMap<usize, PartialToolCall>,
    finish_reason: Option<String>,
    usage: Option<TokenUsage>,
    finished: bool,
}

impl DeltaAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Handle one `data:` payload.
    pub fn apply_data(&mut self, data: &str) -> Result<Vec<StreamEvent>, LlmError> {
        if data.trim() == DONE_MARKER {
            return Ok(self.finish());
        }
        let chunk: StreamChunk = serde_json::from_str(data).map_err(|e| {
            LlmError::parse_error(format!("Failed to parse stream chunk: {}, data: {}", e, data))
        })?;
        if let Some(error) = &chunk.error {
            let code = error.code.as_deref().unwrap_or("unknown");
            let message = error.message.as_deref().unwrap_or("no message");
            return Err(LlmError::stream_error(format!("{}: {}", code, message)));
        }
        Ok(self.apply(chunk))
    }

    pub fn apply(&mut self, chunk: StreamChunk) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        if let Some(usage) = chunk
            .usage
            .or_else(|| chunk.x_groq.and_then(|x| x.usage))
        {
            self.usage = Some(TokenUsage::new(usage.prompt_tokens, usage.completion_tokens));
        }

        let Some(choice) = chunk.choices.into_iter().next() else {
            return events;
        };

        if let Some(reasoning) = choice.delta.reasoning.filter(|r| !r.is_empty()) {
            events.push(StreamEvent::ReasoningDelta(reasoning));
        }
        if let Some(content) = choice.delta.content.filter(|c| !c.is_empty()) {
            events.push(StreamEvent::TextDelta(content));
        }
        for delta in choice.delta.tool_calls.unwrap_or_default() {
            let partial = self.tool_calls.entry(delta.index).or_default();
            if let Some(id) = delta.id.filter(|id| !id.is_empty()) {
                partial.id = Some(id);
            }
            if let Some(function) = delta.function {
                if let Some(name) = function.name.filter(|n| !n.is_empty()) {
                    partial.name = name;
                }
                if let Some(arguments) = function.arguments {
                    partial.arguments.push_str(&arguments);
                }
            }
        }
        if choice.finish_reason.is_some() {
            self.finish_reason = choice.finish_reason;
        }

        events
    }

    /// Emit assembled tool calls and the finish event. Only the first call produces events.
    pub fn finish(&mut self) -> Vec<StreamEvent> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;

        let mut events: Vec<StreamEvent> = std::mem::take(&mut self.tool_calls)
            .into_values()
            .filter(|partial| !partial.name.is_empty())
            .map(|partial| {
                let id = partial
                    .id
                    .unwrap_or_else(|| format!("call_{}", uuid::Uuid::new_v4().simple()));
                StreamEvent::ToolCall(ToolCall::function(id, partial.name, partial.arguments))
            })
            .collect();

        events.push(StreamEvent::Finish {
            finish_reason: self.finish_reason.take(),
            usage: self.usage.take(),
        });
        events
    }
}
