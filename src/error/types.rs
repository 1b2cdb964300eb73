//! Error types for streamchat.

use thiserror::Error;

/// Coarse classification of a [`ChatError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Rejected user input
    Validation,
    /// Connection, status, timeout or mid-stream failures
    Transport,
    /// A frame payload that did not match the expected shape
    Protocol,
    /// Persistence failures
    Storage,
    /// Missing or invalid configuration
    Configuration,
    /// An optional platform capability is not present
    Capability,
    /// Session bookkeeping and internal failures
    Internal,
}

/// Errors produced by the chat client.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChatError {
    /// HTTP-level failure that is neither a timeout nor a refused connection
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// The completion endpoint answered with a non-success status
    #[error("API error {code}: {message}")]
    ApiError { code: u16, message: String },

    /// The connection could not be established
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// The handshake or a stream read took too long
    #[error("Timeout error: {0}")]
    TimeoutError(String),

    /// The byte stream failed after the handshake succeeded
    #[error("Stream error: {0}")]
    StreamError(String),

    /// A data frame payload could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// JSON (de)serialization failure outside the stream
    #[error("JSON error: {0}")]
    JsonError(String),

    /// Persistence failure
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A turn is already streaming into the store
    #[error("A response is already streaming (session {0})")]
    Busy(String),

    /// A write targeted a session that is no longer the in-flight one
    #[error("Stale session: {0}")]
    StaleSession(String),

    /// The operation was cancelled
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Optional capability (e.g. speech recognition) is unavailable
    #[error("Unsupported capability: {0}")]
    UnsupportedCapability(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ChatError {
    /// Build an `ApiError` from a status code and response body.
    pub fn api_error(code: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            code,
            message: message.into(),
        }
    }

    /// Category of this error.
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::HttpError(_)
            | Self::ApiError { .. }
            | Self::ConnectionError(_)
            | Self::TimeoutError(_)
            | Self::StreamError(_) => ErrorCategory::Transport,
            Self::ParseError(_) | Self::JsonError(_) => ErrorCategory::Protocol,
            Self::StorageError(_) => ErrorCategory::Storage,
            Self::ConfigurationError(_) => ErrorCategory::Configuration,
            Self::InvalidInput(_) => ErrorCategory::Validation,
            Self::UnsupportedCapability(_) => ErrorCategory::Capability,
            Self::Busy(_) | Self::StaleSession(_) | Self::Cancelled(_) | Self::InternalError(_) => {
                ErrorCategory::Internal
            }
        }
    }

    /// Whether this error ends a stream session as a failure, which replaces
    /// the in-flight message with the apology text.
    pub const fn is_transport_failure(&self) -> bool {
        matches!(self.category(), ErrorCategory::Transport)
    }

    /// Whether a handshake that failed with this error may be attempted again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::TimeoutError(_) => true,
            Self::ApiError { code, .. } => *code == 429 || (500..600).contains(code),
            _ => false,
        }
    }

    /// HTTP status code, when the error carries one.
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::ApiError { code, .. } => Some(*code),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_errors_trigger_apology() {
        assert!(ChatError::api_error(500, "boom").is_transport_failure());
        assert!(ChatError::StreamError("reset".into()).is_transport_failure());
        assert!(ChatError::TimeoutError("idle".into()).is_transport_failure());
        assert!(!ChatError::ParseError("bad".into()).is_transport_failure());
        assert!(!ChatError::Cancelled("user".into()).is_transport_failure());
    }

    #[test]
    fn retryable_statuses() {
        assert!(ChatError::api_error(429, "").is_retryable());
        assert!(ChatError::api_error(503, "").is_retryable());
        assert!(!ChatError::api_error(401, "").is_retryable());
        assert!(ChatError::ConnectionError("refused".into()).is_retryable());
        assert!(!ChatError::StreamError("reset".into()).is_retryable());
    }

    #[test]
    fn display_includes_status() {
        let err = ChatError::api_error(404, "Not found");
        assert_eq!(err.to_string(), "API error 404: Not found");
        assert_eq!(err.status_code(), Some(404));
    }
}
