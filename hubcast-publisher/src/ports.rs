//! Transport port definitions.
//!
//! Ports define the interface to the ingestion endpoint.
//! Adapters implement these ports for specific providers (stub, HTTP, vendor SDKs).
//! The publisher never sees a provider type, so providers can be swapped
//! without touching call sites.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use hubcast_domain::{Credential, Endpoint, EventPayload, PublishTarget};

/// Batch ceiling used when an endpoint does not advertise one (1 MiB).
pub const DEFAULT_MAX_BATCH_BYTES: usize = 1_048_576;

// =============================================================================
// Connector Port
// =============================================================================

/// Port for establishing a session with an ingestion endpoint.
///
/// Implementations:
/// - `StubConnector` - In-memory endpoint for tests and local runs
/// - `HttpConnector` - Provider-neutral JSON over HTTP
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open a session.
    ///
    /// # Returns
    ///
    /// A transport that exclusively owns the session, or
    /// `TransportError::Unreachable` / `TransportError::Unauthorized`.
    async fn connect(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
        target: &PublishTarget,
    ) -> Result<Box<dyn IngestTransport>, TransportError>;
}

// =============================================================================
// Transport Port
// =============================================================================

/// Port for an open session with an ingestion endpoint.
#[async_trait]
pub trait IngestTransport: Send + Sync {
    /// Largest batch the endpoint accepts, in serialized bytes.
    fn max_batch_bytes(&self) -> usize;

    /// Submit one batch. All events are accepted or none are.
    ///
    /// Dropping the returned future abandons the attempt; the endpoint
    /// may or may not have received the frame.
    async fn send(&self, frame: &BatchFrame) -> Result<(), TransportError>;

    /// Tear down the session. Must not block.
    fn close(&self) -> Result<(), TransportError>;
}

/// A sealed batch as handed to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFrame {
    /// Batch identifier (stable for logging and error reports)
    pub batch_id: Uuid,
    /// Publisher that built the batch
    pub publisher_id: Uuid,
    /// Routing for the whole batch
    pub target: PublishTarget,
    /// Payloads in submission order
    pub events: Vec<EventPayload>,
}

impl BatchFrame {
    /// Number of payloads.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the frame carries no payloads.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Sum of payload serialized sizes.
    pub fn size_bytes(&self) -> usize {
        self.events.iter().map(EventPayload::serialized_size).sum()
    }
}

/// Transport-level failures, mapped onto `PublishError` by the publisher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Endpoint could not be reached
    #[error("Endpoint unreachable: {0}")]
    Unreachable(String),

    /// Credential was refused
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Network fault, throttling or server-side failure
    #[error("Network error: {0}")]
    Network(String),

    /// Endpoint refused the batch content
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Session already torn down
    #[error("Session closed")]
    Closed,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_size_is_sum_of_payloads() {
        let frame = BatchFrame {
            batch_id: Uuid::now_v7(),
            publisher_id: Uuid::now_v7(),
            target: PublishTarget::RoundRobin,
            events: vec![
                EventPayload::new(vec![0u8; 10]).unwrap(),
                EventPayload::new(vec![0u8; 32]).unwrap().with_partition_key("ab"),
            ],
        };

        assert_eq!(frame.len(), 2);
        assert!(!frame.is_empty());
        assert_eq!(frame.size_bytes(), 44);
    }
}
