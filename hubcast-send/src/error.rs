//! Sender error types.

use hubcast_domain::DomainError;
use hubcast_publisher::PublishError;
use thiserror::Error;

/// Sender-level errors.
#[derive(Debug, Error)]
pub enum SendError {
    /// Domain error
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Publisher error
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for sender operations.
pub type SendResult<T> = Result<T, SendError>;
