//! Publisher error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while publishing.
///
/// Nothing here is retried automatically. Only the caller knows whether
/// resending its payloads is safe.
#[derive(Debug, Error)]
pub enum PublishError {
    /// Endpoint unreachable or credential rejected while opening
    #[error("Connection to {endpoint} failed: {reason}")]
    Connection {
        /// Endpoint that was being opened
        endpoint: String,
        /// Underlying cause
        reason: String,
    },

    /// Wrong lifecycle usage (closed publisher, sealed or foreign batch)
    #[error("Invalid state: {0}")]
    State(String),

    /// Network fault or timeout; retry with a fresh batch
    #[error("Transient failure sending batch {batch_id} ({event_count} events): {reason}")]
    TransientSend {
        /// Batch that was in flight
        batch_id: Uuid,
        /// Number of payloads in that batch
        event_count: usize,
        /// Underlying cause
        reason: String,
    },

    /// Endpoint refused the batch; not retryable without modification
    #[error("Batch {batch_id} ({event_count} events) rejected: {reason}")]
    RejectedBatch {
        /// Batch that was refused
        batch_id: Uuid,
        /// Number of payloads in that batch
        event_count: usize,
        /// Reason reported by the endpoint
        reason: String,
    },

    /// Requested batch size exceeds what the endpoint accepts
    #[error("Requested batch size {requested} exceeds endpoint ceiling of {ceiling} bytes")]
    BatchTooLarge {
        /// Requested maximum
        requested: usize,
        /// Endpoint ceiling
        ceiling: usize,
    },

    /// A single payload does not fit an empty batch
    #[error("Payload of {size} bytes does not fit a batch of {max} bytes")]
    PayloadTooLarge {
        /// Serialized payload size
        size: usize,
        /// Batch maximum
        max: usize,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Domain error
    #[error("Domain error: {0}")]
    Domain(#[from] hubcast_domain::DomainError),
}

impl PublishError {
    /// Whether resending the same payloads in a fresh batch may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientSend { .. })
    }

    /// Batch this error refers to, if any.
    pub fn batch_id(&self) -> Option<Uuid> {
        match self {
            Self::TransientSend { batch_id, .. } | Self::RejectedBatch { batch_id, .. } => {
                Some(*batch_id)
            }
            _ => None,
        }
    }
}

/// Result type for publisher operations.
pub type PublishResult<T> = Result<T, PublishError>;
