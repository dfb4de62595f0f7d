//! Provider error types and HTTP error mapping.

use serde::Deserialize;
use thiserror::Error;

use quizkit_core::error::GenerationError;

/// Errors that can occur when persisting or reading quiz history.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The API rejected the bearer token.
    #[error("not authorized, log in again")]
    Unauthorized,

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The local history file could not be read or written.
    #[error("history file error: {0}")]
    Io(#[from] std::io::Error),

    /// The local history file is not valid JSON.
    #[error("history file is corrupt: {0}")]
    Corrupt(String),
}

/// Error body shape used by the learning-app API (`{"error": "..."}`).
#[derive(Deserialize)]
struct ApiErrorBody {
    error: String,
}

/// Pull a human-readable message out of an error response body.
pub(crate) fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| body.trim().to_string())
}

/// Map a transport failure from reqwest.
pub(crate) fn transport_error(err: &reqwest::Error, timeout_secs: u64) -> GenerationError {
    if err.is_timeout() {
        GenerationError::Timeout(timeout_secs)
    } else {
        GenerationError::NetworkError(err.to_string())
    }
}

/// Map a non-success HTTP status for a generation call.
pub(crate) fn generation_status_error(
    status: u16,
    retry_after_secs: Option<u64>,
    body: &str,
) -> GenerationError {
    match status {
        429 => GenerationError::RateLimited {
            retry_after_ms: retry_after_secs.unwrap_or(5) * 1000,
        },
        400 => GenerationError::InvalidRequest(error_message(body)),
        _ => GenerationError::ApiError {
            status,
            message: error_message(body),
        },
    }
}

/// Parse a `retry-after` header value given in seconds.
pub(crate) fn retry_after_secs(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}
