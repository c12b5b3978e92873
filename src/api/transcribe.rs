//! Transcription endpoint: forwards one uploaded audio file to the speech-to-text provider.

use std::sync::Arc;

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;

use crate::transcribe::AudioUpload;

use super::routes::AppState;
use super::{error_response, ApiError};

/// Multipart field holding the audio file.
pub const AUDIO_FIELD: &str = "audio";

const FAILED_MESSAGE: &str = "Failed to transcribe audio";

#[derive(Debug, Serialize)]
pub struct TranscriptionResponse {
    pub text: String,
}

/// POST /api/transcribe
///
/// 503 when no provider key is configured, 400 when the `audio` field is
/// missing, 500 for any failure reading the upload or calling the provider.
pub async fn transcribe(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TranscriptionResponse>, ApiError> {
    let Some(transcriber) = state.transcriber.clone() else {
        return Err(error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "GROQ_API_KEY environment variable not configured",
        ));
    };

    let mut multipart = multipart.map_err(|e| {
        tracing::error!("Transcription error: {}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, FAILED_MESSAGE)
    })?;

    let audio = read_audio_field(&mut multipart).await.map_err(|e| {
        tracing::error!("Transcription error: {}", e);
        error_response(StatusCode::INTERNAL_SERVER_ERROR, FAILED_MESSAGE)
    })?;

    let Some(audio) = audio else {
        return Err(error_response(
            StatusCode::BAD_REQUEST,
            "No audio file provided",
        ));
    };

    match transcriber.transcribe(audio).await {
        Ok(text) => Ok(Json(TranscriptionResponse { text })),
        Err(e) => {
            tracing::error!("Transcription error: {}", e);
            Err(error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                FAILED_MESSAGE,
            ))
        }
    }
}

/// Take the first `audio` field, skipping every other field.
///
/// An empty file is still an upload; the provider decides whether it is valid.
async fn read_audio_field(
    multipart: &mut Multipart,
) -> Result<Option<AudioUpload>, axum::extract::multipart::MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(AUDIO_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(|s| s.to_string())
            .unwrap_or_else(|| "audio.webm".to_string());
        let content_type = field.content_type().map(|s| s.to_string());
        let data = field.bytes().await?;

        return Ok(Some(AudioUpload {
            file_name,
            content_type,
            data,
        }));
    }

    Ok(None)
}
