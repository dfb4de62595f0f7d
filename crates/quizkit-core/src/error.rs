//! Collaborator error types.
//!
//! Generation failures are defined here so the controller can downcast an
//! `anyhow::Error` from any generator and classify it without string matching.

use thiserror::Error;

/// Errors that can occur when requesting generated quiz text.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The service returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The service could not be reached.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The service rejected the request (bad topic or count).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The service returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },
}

/// The three user-facing failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    RateLimited,
    Network,
    Other,
}

const RATE_LIMITED_MESSAGE: &str = "System is busy, please try again in a moment.";
const NETWORK_MESSAGE: &str = "Network error, check your connection.";
const GENERIC_MESSAGE: &str = "Something went wrong. Try again.";

impl GenerationError {
    pub fn kind(&self) -> FailureKind {
        match self {
            GenerationError::RateLimited { .. } => FailureKind::RateLimited,
            GenerationError::Timeout(_) | GenerationError::NetworkError(_) => FailureKind::Network,
            GenerationError::InvalidRequest(_) | GenerationError::ApiError { .. } => {
                FailureKind::Other
            }
        }
    }

    /// Message shown to the user. Server-provided messages are passed through
    /// for the generic category when present.
    pub fn user_message(&self) -> String {
        match self {
            GenerationError::RateLimited { .. } => RATE_LIMITED_MESSAGE.to_string(),
            GenerationError::Timeout(_) | GenerationError::NetworkError(_) => {
                NETWORK_MESSAGE.to_string()
            }
            GenerationError::InvalidRequest(message) | GenerationError::ApiError { message, .. }
                if !message.trim().is_empty() =>
            {
                message.clone()
            }
            _ => GENERIC_MESSAGE.to_string(),
        }
    }
}

/// Classify an arbitrary collaborator error into a user-facing message.
///
/// Errors that are not a [`GenerationError`] fall into the generic category.
pub fn classify(err: &anyhow::Error) -> (FailureKind, String) {
    match err.downcast_ref::<GenerationError>() {
        Some(e) => (e.kind(), e.user_message()),
        None => (FailureKind::Other, GENERIC_MESSAGE.to_string()),
    }
}

/// Rejected generation request parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Topic is required")]
    EmptyTopic,

    #[error("Count must be one of: 5, 10, 15, 20.")]
    InvalidCount(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_have_distinct_messages() {
        let rate = GenerationError::RateLimited { retry_after_ms: 5000 };
        let net = GenerationError::NetworkError("connection refused".into());
        let other = GenerationError::ApiError {
            status: 500,
            message: String::new(),
        };
        assert_eq!(rate.kind(), FailureKind::RateLimited);
        assert_eq!(net.kind(), FailureKind::Network);
        assert_eq!(other.kind(), FailureKind::Other);

        let messages = [rate.user_message(), net.user_message(), other.user_message()];
        assert_ne!(messages[0], messages[1]);
        assert_ne!(messages[1], messages[2]);
        assert_ne!(messages[0], messages[2]);
    }

    #[test]
    fn timeout_reads_as_network() {
        assert_eq!(GenerationError::Timeout(30).kind(), FailureKind::Network);
    }

    #[test]
    fn server_message_passes_through() {
        let err = GenerationError::ApiError {
            status: 400,
            message: "Invalid request. Please modify your topic.".into(),
        };
        assert_eq!(err.user_message(), "Invalid request. Please modify your topic.");
    }

    #[test]
    fn classify_downcasts_anyhow() {
        let err: anyhow::Error = GenerationError::RateLimited { retry_after_ms: 1 }.into();
        assert_eq!(classify(&err).0, FailureKind::RateLimited);

        let plain = anyhow::anyhow!("boom");
        let (kind, message) = classify(&plain);
        assert_eq!(kind, FailureKind::Other);
        assert_eq!(message, GENERIC_MESSAGE);
    }
}
