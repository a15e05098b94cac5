//! Handler error types.

use thiserror::Error;

/// Errors raised while decoding a received event.
///
/// These are returned to the host, never panicked on, so a malformed event
/// cannot take down the process.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Event body is not valid UTF-8
    #[error("Event body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// Event body is not valid JSON (or not the expected shape)
    #[error("Event body is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Result type for handler operations.
pub type HandlerResult<T> = Result<T, HandlerError>;
