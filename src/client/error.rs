use std::error::Error as StdError;

use thiserror::Error;

/// Classified transport failure.
///
/// The transport never retries or recovers; it classifies and surfaces.
/// Variants are `Clone` so one in-flight request's outcome can be shared by
/// every deduplicated waiter.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    #[error("resource not found")]
    NotFound,
    #[error("server error (status {status})")]
    ServerError { status: u16 },
    #[error("connection refused")]
    ConnectionRefused,
    #[error("network error: {message}")]
    NetworkError { message: String },
    #[error("request timed out")]
    Timeout,
    #[error("validation failed: {detail}")]
    Validation { detail: String },
    #[error("unexpected response (status {status}): {message}")]
    Other { status: u16, message: String },
    #[error("failed to decode response body: {message}")]
    Decode { message: String },
    #[error("invalid request url: {message}")]
    InvalidUrl { message: String },
    #[error("failed to build http client: {message}")]
    Build { message: String },
}

impl ApiError {
    /// Classify a request-level failure (no HTTP response was produced).
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout;
        }
        if err.is_connect() && io_error_kind(err) == Some(std::io::ErrorKind::ConnectionRefused) {
            return Self::ConnectionRefused;
        }
        Self::NetworkError {
            message: err.to_string(),
        }
    }

    /// Classify a non-success HTTP response from its status and raw body.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        match status {
            404 => Self::NotFound,
            422 => Self::Validation {
                detail: extract_detail(body).unwrap_or_else(|| "invalid input".to_string()),
            },
            500..=599 => Self::ServerError { status },
            _ => Self::Other {
                status,
                message: extract_detail(body)
                    .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string()),
            },
        }
    }

    /// The server-provided detail message, when one exists.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Validation { detail } => Some(detail),
            Self::Other { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

/// Walk the error source chain looking for an io error kind.
fn io_error_kind(err: &(dyn StdError + 'static)) -> Option<std::io::ErrorKind> {
    let mut source = err.source();
    while let Some(inner) = source {
        if let Some(io) = inner.downcast_ref::<std::io::Error>() {
            return Some(io.kind());
        }
        source = inner.source();
    }
    None
}

/// Pull the `detail` field out of an API error body.
///
/// FastAPI-style servers return `{"detail": "..."}` for hand-raised errors and
/// `{"detail": [...]}` for validation errors; anything else is stringified.
fn extract_detail(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(detail) => Some(detail.clone()),
        other => Some(other.to_string()),
    }
}
