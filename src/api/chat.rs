//! Chat endpoint: tool resolution, the bounded tool loop and response streaming.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::Instant;
use uuid::Uuid;

use crate::config::DEEPSEEK_MODEL;
use crate::llm::{
    ChatMessage, ChatOptions, CompletionRequest, CompletionStream, LlmClient, LlmError, Role,
    StreamEvent, TokenUsage, ToolCall,
};
use crate::prompt::SYSTEM_PROMPT;
use crate::tools::{ToolBindings, ToolRegistry};

use super::routes::AppState;
use super::stream::{
    normalize_finish_reason, DataStreamPart, DATA_STREAM_HEADER, DATA_STREAM_VERSION,
};

/// Model steps per request, counting the first one.
pub const MAX_STEPS: usize = 3;

/// Tools offered on every request regardless of settings.
pub const BUILTIN_TOOLS: [&str; 2] = ["weather", "delay"];

/// Error text sent to the client when the provider fails mid-stream.
const STREAM_ERROR_MESSAGE: &str = "An error occurred.";

/// POST /api/chat body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub messages: Vec<UiMessage>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub enabled_tools: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UiRole {
    System,
    User,
    Assistant,
    Data,
}

/// A message as the chat UI sends it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiMessage {
    pub role: UiRole,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tool_invocations: Vec<ToolInvocation>,
}

/// A tool call recorded on an assistant message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolInvocation {
    pub tool_call_id: String,
    pub tool_name: String,
    #[serde(default)]
    pub args: Value,
    #[serde(default)]
    pub result: Option<Value>,
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Invalid chat request body: {0}")]
    InvalidBody(#[from] serde_json::Error),

    #[error("Tool invocation '{0}' has no result")]
    IncompleteToolInvocation(String),

    #[error("Provider error: {0}")]
    Provider(#[from] LlmError),

    #[error("Chat request exceeded {0:?} before the first response")]
    TimedOut(Duration),
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        tracing::error!("Chat request failed: {}", self);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

/// Convert UI messages into provider messages.
///
/// Assistant messages with tool invocations become an assistant turn with
/// tool calls followed by one tool message per result.
pub fn convert_messages(messages: &[UiMessage]) -> Result<Vec<ChatMessage>, ChatError> {
    let mut converted = Vec::with_capacity(messages.len());

    for message in messages {
        match message.role {
            UiRole::System => converted.push(ChatMessage::new(Role::System, &message.content)),
            UiRole::User => converted.push(ChatMessage::new(Role::User, &message.content)),
            UiRole::Data => {}
            UiRole::Assistant if message.tool_invocations.is_empty() => {
                converted.push(ChatMessage::new(Role::Assistant, &message.content));
            }
            UiRole::Assistant => {
                let mut calls = Vec::with_capacity(message.tool_invocations.len());
                let mut results = Vec::with_capacity(message.tool_invocations.len());
                for invocation in &message.tool_invocations {
                    let result = invocation.result.as_ref().ok_or_else(|| {
                        ChatError::IncompleteToolInvocation(invocation.tool_call_id.clone())
                    })?;
                    calls.push(ToolCall::function(
                        &invocation.tool_call_id,
                        &invocation.tool_name,
                        invocation.args.to_string(),
                    ));
                    results.push(ChatMessage::tool_result(
                        &invocation.tool_call_id,
                        result.to_string(),
                    ));
                }
                converted.push(ChatMessage::assistant_tool_calls(
                    Some(message.content.clone()),
                    calls,
                ));
                converted.extend(results);
            }
        }
    }

    Ok(converted)
}

/// Tools offered for one request: the built-ins plus every enabled id that resolves.
///
/// Ids without a binding are dropped; the caller and the model are not told.
pub fn resolve_tools(
    registry: &ToolRegistry,
    bindings: &ToolBindings,
    enabled: &[String],
) -> ToolRegistry {
    let resolution = bindings.resolve(enabled);
    for id in &resolution.unknown {
        tracing::warn!(tool_id = %id, "Dropping enabled tool with no registered binding");
    }

    registry.select(
        BUILTIN_TOOLS
            .iter()
            .copied()
            .chain(resolution.keys.iter().map(String::as_str)),
    )
}

fn chat_options(model: &str) -> ChatOptions {
    ChatOptions {
        reasoning_format: (model == DEEPSEEK_MODEL).then(|| "parsed".to_string()),
    }
}

/// POST /api/chat
pub async fn chat(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response, ChatError> {
    let limit = state.config.chat_max_duration;
    let deadline = Instant::now() + limit;

    let request: ChatRequest = serde_json::from_slice(&body)?;
    let model = request
        .model
        .unwrap_or_else(|| state.config.default_model.clone());
    let tools = resolve_tools(&state.tools, &state.bindings, &request.enabled_tools);

    let mut messages = vec![ChatMessage::new(Role::System, SYSTEM_PROMPT)];
    messages.extend(convert_messages(&request.messages)?);

    tracing::info!(
        model = %model,
        messages = messages.len(),
        tools = tools.len(),
        "Starting chat completion"
    );

    let completion = CompletionRequest {
        options: chat_options(&model),
        model,
        messages,
        tools: tools.definitions(),
    };

    let first = tokio::time::timeout_at(deadline, state.llm.stream_chat(completion.clone()))
        .await
        .map_err(|_| ChatError::TimedOut(limit))??;

    let parts = run_steps(Arc::clone(&state.llm), tools, completion, first, MAX_STEPS);
    let body = Body::from_stream(with_deadline(parts, deadline, limit));

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
            (
                HeaderName::from_static(DATA_STREAM_HEADER),
                HeaderValue::from_static(DATA_STREAM_VERSION),
            ),
        ],
        body,
    )
        .into_response())
}

/// Run one tool call, turning every failure into an `{error}` result for the model.
async fn execute_call(tools: &ToolRegistry, call: &ToolCall) -> Value {
    let args = match call.parsed_arguments() {
        Ok(args) => args,
        Err(e) => {
            return json!({
                "error": format!("Invalid arguments for {}: {}", call.function.name, e)
            })
        }
    };

    match tools.execute(&call.function.name, args).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(tool = %call.function.name, error = %e, "Tool call failed");
            json!({ "error": e.to_string() })
        }
    }
}

/// Drive up to `max_steps` model calls, executing tool calls between them.
pub fn run_steps(
    llm: Arc<dyn LlmClient>,
    tools: ToolRegistry,
    mut request: CompletionRequest,
    first: CompletionStream,
    max_steps: usize,
) -> impl Stream<Item = DataStreamPart> + Send + 'static {
    async_stream::stream! {
        let mut current = first;
        let mut total_usage = TokenUsage::default();
        let mut step = 1;

        loop {
            yield DataStreamPart::StartStep {
                message_id: format!("msg-{}", Uuid::new_v4().simple()),
            };

            let mut text = String::new();
            let mut calls: Vec<ToolCall> = Vec::new();
            let mut finish_reason: Option<String> = None;
            let mut step_usage = TokenUsage::default();

            while let Some(event) = current.next().await {
                match event {
                    Ok(StreamEvent::TextDelta(delta)) => {
                        text.push_str(&delta);
                        yield DataStreamPart::Text(delta);
                    }
                    Ok(StreamEvent::ReasoningDelta(delta)) => {
                        yield DataStreamPart::Reasoning(delta);
                    }
                    Ok(StreamEvent::ToolCall(call)) => {
                        let args = call
                            .parsed_arguments()
                            .unwrap_or_else(|_| Value::String(call.function.arguments.clone()));
                        yield DataStreamPart::ToolCall {
                            tool_call_id: call.id.clone(),
                            tool_name: call.function.name.clone(),
                            args,
                        };
                        calls.push(call);
                    }
                    Ok(StreamEvent::Finish { finish_reason: reason, usage }) => {
                        finish_reason = reason;
                        step_usage = usage.unwrap_or_default();
                    }
                    Err(e) => {
                        tracing::error!(step, "Chat stream failed: {}", e);
                        yield DataStreamPart::Error(STREAM_ERROR_MESSAGE.to_string());
                        return;
                    }
                }
            }

            total_usage = total_usage.add(step_usage);

            let mut results = Vec::with_capacity(calls.len());
            for call in &calls {
                let result = execute_call(&tools, call).await;
                yield DataStreamPart::ToolResult {
                    tool_call_id: call.id.clone(),
                    result: result.clone(),
                };
                results.push(result);
            }

            let finish_reason = if calls.is_empty() {
                normalize_finish_reason(finish_reason.as_deref())
            } else {
                "tool-calls".to_string()
            };
            yield DataStreamPart::FinishStep {
                finish_reason: finish_reason.clone(),
                usage: step_usage.into(),
                is_continued: false,
            };

            if calls.is_empty() || step >= max_steps {
                if !calls.is_empty() {
                    tracing::debug!(max_steps, "Tool loop stopped at step limit");
                }
                yield DataStreamPart::FinishMessage {
                    finish_reason,
                    usage: total_usage.into(),
                };
                return;
            }

            request
                .messages
                .push(ChatMessage::assistant_tool_calls(Some(text), calls.clone()));
            for (call, result) in calls.iter().zip(results) {
                request
                    .messages
                    .push(ChatMessage::tool_result(&call.id, result.to_string()));
            }

            step += 1;
            current = match llm.stream_chat(request.clone()).await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::error!(step, "Chat continuation failed: {}", e);
                    yield DataStreamPart::Error(STREAM_ERROR_MESSAGE.to_string());
                    return;
                }
            };
        }
    }
}

/// Encode parts as body chunks, aborting the body once `deadline` passes.
fn with_deadline<S>(
    parts: S,
    deadline: Instant,
    limit: Duration,
) -> impl Stream<Item = Result<Bytes, io::Error>> + Send + 'static
where
    S: Stream<Item = DataStreamPart> + Send + 'static,
{
    async_stream::stream! {
        let mut parts = Box::pin(parts);
        loop {
            match tokio::time::timeout_at(deadline, parts.next()).await {
                Ok(Some(part)) => {
                    yield Ok(Bytes::from(part.encode()));
                }
                Ok(None) => break,
                Err(_) => {
                    tracing::warn!(?limit, "Chat response exceeded its maximum duration");
                    yield Err(io::Error::new(
                        io::ErrorKind::TimedOut,
                        "chat response exceeded its maximum duration",
                    ));
                    break;
                }
            }
        }
    }
}
