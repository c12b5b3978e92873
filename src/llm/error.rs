//! Error type for LLM provider calls.

use std::fmt;

/// Broad classification of a provider failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// 429 from the provider.
    RateLimited,
    /// 5xx from the provider.
    ServerError,
    /// Other 4xx (bad request, auth, unknown model).
    ClientError,
    /// Could not reach the provider or the connection dropped.
    Network,
    /// The provider answered with something we could not parse.
    Parse,
    /// The provider reported an error inside an already open stream.
    Stream,
}

impl fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LlmErrorKind::RateLimited => "rate limited",
            LlmErrorKind::ServerError => "server error",
            LlmErrorKind::ClientError => "client error",
            LlmErrorKind::Network => "network error",
            LlmErrorKind::Parse => "parse error",
            LlmErrorKind::Stream => "stream error",
        };
        f.write_str(s)
    }
}

/// Classify an HTTP status code.
pub fn classify_http_status(status: u16) -> LlmErrorKind {
    match status {
        429 => LlmErrorKind::RateLimited,
        500..=599 => LlmErrorKind::ServerError,
        _ => LlmErrorKind::ClientError,
    }
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl LlmError {
    fn new(kind: LlmErrorKind, status: Option<u16>, message: String) -> Self {
        Self {
            kind,
            status,
            message,
        }
    }

    /// Build an error from a non-success HTTP response.
    pub fn from_status(status: u16, body: String) -> Self {
        Self::new(classify_http_status(status), Some(status), body)
    }

    pub fn network_error(message: String) -> Self {
        Self::new(LlmErrorKind::Network, None, message)
    }

    pub fn parse_error(message: String) -> Self {
        Self::new(LlmErrorKind::Parse, None, message)
    }

    pub fn stream_error(message: String) -> Self {
        Self::new(LlmErrorKind::Stream, None, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_http_status() {
        assert_eq!(classify_http_status(429), LlmErrorKind::RateLimited);
        assert_eq!(classify_http_status(503), LlmErrorKind::ServerError);
        assert_eq!(classify_http_status(401), LlmErrorKind::ClientError);
    }

    #[test]
    fn test_display() {
        let err = LlmError::from_status(500, "boom".to_string());
        assert_eq!(err.to_string(), "server error: boom");
        assert_eq!(err.status, Some(500));
    }
}
