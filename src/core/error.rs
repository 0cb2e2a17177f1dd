//! Custom error types for scenechat
//!
//! Provides a unified error handling system across all modules. Expected
//! tool failures are not errors here: they are folded back into the
//! conversation as tool-result text so the model can self-correct.

use thiserror::Error;

/// Main error type for scenechat operations
#[derive(Error, Debug)]
pub enum SceneChatError {
    /// Bad engine or model name; rejected before any streaming begins
    #[error("Validation error: {0}")]
    Validation(String),

    /// Rate-limit / timeout / 5xx-class backend failure; retried per policy
    #[error("Transient backend error: {0}")]
    TransientBackend(String),

    /// Auth / bad-request-class backend failure; never retried
    #[error("Backend error: {0}")]
    FatalBackend(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for scenechat operations
pub type Result<T> = std::result::Result<T, SceneChatError>;

impl SceneChatError {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a transient backend error
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::TransientBackend(msg.into())
    }

    /// Create a fatal backend error
    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::FatalBackend(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the retry policy applies to this error
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientBackend(_))
    }
}

impl From<reqwest::Error> for SceneChatError {
    fn from(e: reqwest::Error) -> Self {
        // Connection-level and timeout failures are worth retrying; anything
        // the server rejected outright is not.
        if e.is_timeout() || e.is_connect() {
            Self::TransientBackend(e.to_string())
        } else {
            Self::FatalBackend(e.to_string())
        }
    }
}

/// Classify an HTTP status from a model backend.
///
/// 429 and all 5xx are transient; every other non-success status is fatal.
pub fn classify_status(status: reqwest::StatusCode, body: &str) -> SceneChatError {
    let detail = format!("{}: {}", status, body);
    if status.as_u16() == 429 || status.is_server_error() {
        SceneChatError::TransientBackend(detail)
    } else {
        SceneChatError::FatalBackend(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        let e = classify_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(e.is_transient());

        let e = classify_status(reqwest::StatusCode::BAD_GATEWAY, "upstream");
        assert!(e.is_transient());

        let e = classify_status(reqwest::StatusCode::UNAUTHORIZED, "bad key");
        assert!(!e.is_transient());

        let e = classify_status(reqwest::StatusCode::BAD_REQUEST, "bad body");
        assert!(!e.is_transient());
    }

    #[test]
    fn test_validation_not_transient() {
        assert!(!SceneChatError::validation("nope").is_transient());
    }
}
