//! Groq chat completions client (OpenAI-compatible API, SSE streaming).

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::Serialize;

use super::error::LlmError;
use super::sse::{DeltaAccumulator, SseDecoder};
use super::{ChatMessage, CompletionRequest, CompletionStream, LlmClient, ToolDefinition};

const GROQ_CHAT_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Groq API client.
pub struct GroqClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GroqClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            endpoint: GROQ_CHAT_URL.to_string(),
        }
    }

    /// Point the client at another OpenAI-compatible endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn build_request(request: CompletionRequest) -> GroqRequest {
        let has_tools = !request.tools.is_empty();
        GroqRequest {
            model: request.model,
            messages: request.messages,
            tools: has_tools.then_some(request.tools),
            tool_choice: has_tools.then(|| "auto".to_string()),
            reasoning_format: request.options.reasoning_format,
            stream: true,
        }
    }
}

#[async_trait]
impl LlmClient for GroqClient {
    async fn stream_chat(&self, request: CompletionRequest) -> Result<CompletionStream, LlmError> {
        let body = Self::build_request(request);
        tracing::debug!(
            model = %body.model,
            messages = body.messages.len(),
            tools = body.tools.as_ref().map_or(0, Vec::len),
            "Sending streaming request to Groq"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::network_error(format!("Request timeout: {}", e))
                } else if e.is_connect() {
                    LlmError::network_error(format!("Connection failed: {}", e))
                } else {
                    LlmError::network_error(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let error = LlmError::from_status(status.as_u16(), body);
            tracing::error!("Groq request failed: {}", error);
            return Err(error);
        }

        let mut bytes = Box::pin(response.bytes_stream());
        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            let mut accumulator = DeltaAccumulator::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(LlmError::network_error(format!("Stream interrupted: {}", e)));
                        return;
                    }
                };

                for data in decoder.push(&chunk) {
                    match accumulator.apply_data(&data) {
                        Ok(events) => {
                            for event in events {
                                yield Ok(event);
                            }
                        }
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                    if accumulator.is_finished() {
                        return;
                    }
                }
            }

            if let Some(data) = decoder.finish() {
                match accumulator.apply_data(&data) {
                    Ok(events) => {
                        for event in events {
                            yield Ok(event);
                        }
                    }
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                }
            }

            // Stream closed without a [DONE] marker
            for event in accumulator.finish() {
                yield Ok(event);
            }
        };

        Ok(stream.boxed())
    }
}

/// Groq API request format.
#[derive(Debug, Serialize)]
struct GroqRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_format: Option<String>,
    stream: bool,
}
