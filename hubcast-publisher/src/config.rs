//! Publisher configuration.

use std::time::Duration;

use hubcast_domain::{Credential, Endpoint, PublishTarget};

/// Default time allowed for one `send_batch` call.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything needed to open an `EventPublisher`.
#[derive(Debug, Clone)]
pub struct PublisherConfig {
    /// Ingestion endpoint address
    pub endpoint: Endpoint,
    /// Credential presented when the session opens
    pub credential: Credential,
    /// Default routing for batches
    pub target: PublishTarget,
    /// Default batch size; `None` uses the endpoint ceiling
    pub max_batch_bytes: Option<usize>,
    /// Default timeout for `send_batch`
    pub send_timeout: Duration,
}

impl PublisherConfig {
    /// Round-robin routing, endpoint-defined batch size, 60 s send timeout.
    pub fn new(endpoint: Endpoint, credential: Credential) -> Self {
        Self {
            endpoint,
            credential,
            target: PublishTarget::RoundRobin,
            max_batch_bytes: None,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// Route every batch to a fixed partition or key.
    pub fn with_target(mut self, target: PublishTarget) -> Self {
        self.target = target;
        self
    }

    /// Default maximum size for new batches.
    pub fn with_max_batch_bytes(mut self, max_batch_bytes: usize) -> Self {
        self.max_batch_bytes = Some(max_batch_bytes);
        self
    }

    /// Default timeout for `send_batch`.
    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }
}
