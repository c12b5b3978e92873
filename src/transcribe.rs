//! Speech-to-text client (Groq Whisper, OpenAI-compatible transcription API).

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::Deserialize;

const GROQ_TRANSCRIPTION_URL: &str = "https://api.groq.com/openai/v1/audio/transcriptions";

/// One uploaded audio file.
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Fixed request parameters sent with every transcription.
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptionOptions {
    pub model: String,
    pub language: String,
    pub response_format: String,
    pub temperature: f32,
}

impl Default for TranscriptionOptions {
    fn default() -> Self {
        Self {
            model: "whisper-large-v3-turbo".to_string(),
            language: "en".to_string(),
            response_format: "json".to_string(),
            temperature: 0.0,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TranscribeError {
    #[error("Transcription request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Transcription service returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Invalid transcription response: {0}")]
    InvalidResponse(String),
}

/// A speech-to-text provider.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(&self, audio: AudioUpload) -> Result<String, TranscribeError>;
}

pub struct GroqTranscriber {
    client: Client,
    api_key: String,
    endpoint: String,
    options: TranscriptionOptions,
}

impl GroqTranscriber {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            endpoint: GROQ_TRANSCRIPTION_URL.to_string(),
            options: TranscriptionOptions::default(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn build_form(&self, audio: AudioUpload) -> Result<reqwest::multipart::Form, TranscribeError> {
        let mut part = reqwest::multipart::Part::bytes(audio.data.to_vec()).file_name(audio.file_name);
        if let Some(content_type) = audio.content_type {
            part = part.mime_str(&content_type)?;
        }

        Ok(reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.options.model.clone())
            .text("language", self.options.language.clone())
            .text("response_format", self.options.response_format.clone())
            .text("temperature", self.options.temperature.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[async_trait]
impl Transcriber for GroqTranscriber {
    async fn transcribe(&self, audio: AudioUpload) -> Result<String, TranscribeError> {
        tracing::debug!(
            file = %audio.file_name,
            bytes = audio.data.len(),
            model = %self.options.model,
            "Sending audio for transcription"
        );

        let form = self.build_form(audio)?;
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscribeError::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let parsed: TranscriptionResponse = serde_json::from_str(&body)
            .map_err(|e| TranscribeError::InvalidResponse(format!("{}: {}", e, body)))?;
        Ok(parsed.text)
    }
}
