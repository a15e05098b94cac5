//! Hubcast Sender
//!
//! Process glue: publish one message to the configured endpoint and report
//! how long it took.
//!
//! # Usage
//!
//! ```bash
//! # Against the in-memory stub endpoint
//! HUBCAST_ENV=test cargo run -p hubcast-send
//!
//! # Against an HTTP ingestion gateway
//! HUBCAST_ENDPOINT=https://ingest.example.com HUBCAST_CREDENTIAL=... cargo run -p hubcast-send
//! ```

#![warn(clippy::all)]

pub mod config;
pub mod error;

use std::time::{Duration, Instant};
use tracing::info;
use uuid::Uuid;

use hubcast_domain::EventPayload;
use hubcast_publisher::{Connector, EventPublisher, HttpConnector, PublishError, StubConnector};

pub use config::{Config, Environment};
pub use error::{SendError, SendResult};

/// What a run sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendReport {
    /// Batch that carried the message
    pub batch_id: Uuid,
    /// Serialized bytes sent
    pub bytes: usize,
    /// Open + send + close
    pub elapsed: Duration,
}

/// Publish the configured message using the connector for the environment.
pub async fn run(config: &Config) -> SendResult<SendReport> {
    match config.environment {
        Environment::Test => run_with(config, &StubConnector::new()).await,
        Environment::Development | Environment::Production => {
            run_with(config, &HttpConnector::new()).await
        }
    }
}

/// Publish the configured message through a specific connector.
pub async fn run_with(config: &Config, connector: &dyn Connector) -> SendResult<SendReport> {
    let started = Instant::now();

    let mut publisher = EventPublisher::open(config.publisher_config(), connector).await?;
    let (batch_id, bytes) = send_single_message(&mut publisher, &config.message).await?;
    publisher.close();

    Ok(SendReport {
        batch_id,
        bytes,
        elapsed: started.elapsed(),
    })
}

/// Send one message in its own batch.
///
/// Routing is whatever the publisher was opened with; without a partition
/// id or key the endpoint distributes batches round-robin.
pub async fn send_single_message(
    publisher: &mut EventPublisher,
    message: &str,
) -> SendResult<(Uuid, usize)> {
    let payload = EventPayload::from_text(message)?;
    let mut batch = publisher.create_batch(None)?;

    if !batch.add(payload.clone())? {
        return Err(PublishError::PayloadTooLarge {
            size: payload.serialized_size(),
            max: batch.max_size_bytes(),
        }
        .into());
    }

    publisher.send_batch(&mut batch).await?;
    info!(batch_id = %batch.id(), bytes = batch.size_bytes(), "Message sent");

    Ok((batch.id(), batch.size_bytes()))
}

// =============================================================================
// Tests
// =============================================================================
