//! HTTP API.
//!
//! - `POST /api/chat`: streamed chat completion with tool calling
//! - `POST /api/transcribe`: speech-to-text for one uploaded audio file
//! - `/api/settings/*`: tool catalog, enabled flags and credentials
//! - `GET /api/health`

pub mod chat;
mod routes;
pub mod settings;
pub mod stream;
pub mod transcribe;

pub use routes::{build_router, serve, AppState};

use axum::{http::StatusCode, response::Json};
use serde::{Deserialize, Serialize};

/// JSON error payload: `{"error": "..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

pub fn error_response(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
}
