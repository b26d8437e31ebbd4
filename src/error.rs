//! Error handling for the scan server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not found (terminal for a given identifier, never retried automatically)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Payload could not be interpreted as an equipment identifier
    #[error("Unreadable payload: {0}")]
    Unreadable(String),

    /// Camera/decoder failure, fatal to the current capture session
    #[error("Device error: {0}")]
    Device(String),

    /// A resolution source errored or is unreachable; recovered by falling
    /// through to the next source, never surfaced to callers directly
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error (malformed wire body, bad seed file)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Config error
    #[error("Config error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            Error::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            Error::Unreadable(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNREADABLE_PAYLOAD",
                msg.clone(),
            ),
            Error::Device(msg) => (StatusCode::SERVICE_UNAVAILABLE, "DEVICE_ERROR", msg.clone()),
            Error::SourceUnavailable(msg) => {
                (StatusCode::BAD_GATEWAY, "SOURCE_UNAVAILABLE", msg.clone())
            }
            Error::Serialization(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "SERIALIZATION_ERROR",
                e.to_string(),
            ),
            Error::Http(e) => (StatusCode::BAD_GATEWAY, "HTTP_ERROR", e.to_string()),
            Error::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR", e.to_string()),
            Error::Parse(msg) => (StatusCode::BAD_REQUEST, "PARSE_ERROR", msg.clone()),
            Error::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR", msg.clone()),
            Error::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg.clone(),
            ),
        };

        tracing::error!(
            status = %status,
            error_code = %error_code,
            message = %message,
            "Request error"
        );

        let body = Json(json!({
            "error_code": error_code,
            "message": message
        }));

        (status, body).into_response()
    }
}
