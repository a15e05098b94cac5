//! Event publisher.
//!
//! Owns one session with an ingestion endpoint and mediates batch
//! creation and submission. The session is released by `close()` or, on
//! every other exit path, when the publisher is dropped.

use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};
use uuid::Uuid;

use hubcast_domain::{Endpoint, EventPayload, PublishTarget};

use crate::batch::{BatchOptions, EventBatch};
use crate::config::PublisherConfig;
use crate::error::{PublishError, PublishResult};
use crate::ports::{Connector, IngestTransport, TransportError};

/// Totals reported by `EventPublisher::send_all`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SendSummary {
    /// Batches submitted
    pub batches: usize,
    /// Payloads submitted
    pub events: usize,
    /// Serialized bytes submitted
    pub bytes: usize,
}

/// Logical session with an ingestion endpoint.
///
/// `send_batch` takes `&mut self`, so a publisher runs one operation at a
/// time. Share one across tasks only behind an async mutex; batches sent
/// sequentially from one publisher reach the endpoint in submission order.
pub struct EventPublisher {
    id: Uuid,
    endpoint: Endpoint,
    target: PublishTarget,
    /// Largest batch the endpoint accepts
    ceiling: usize,
    /// Size used by `create_batch(None)`
    default_batch_bytes: usize,
    send_timeout: Duration,
    /// `None` once closed
    transport: Option<Box<dyn IngestTransport>>,
    batches_sent: u64,
}

impl EventPublisher {
    /// Open a session with the configured endpoint.
    ///
    /// # Errors
    ///
    /// - `PublishError::Connection` if the endpoint is unreachable, refuses the
    ///   credential, or advertises a zero batch ceiling
    /// - `PublishError::BatchTooLarge` if the configured batch size exceeds the endpoint ceiling
    /// - `PublishError::Config` if the configured batch size is zero
    pub async fn open(config: PublisherConfig, connector: &dyn Connector) -> PublishResult<Self> {
        let PublisherConfig {
            endpoint,
            credential,
            target,
            max_batch_bytes,
            send_timeout,
        } = config;

        let transport = connector
            .connect(&endpoint, &credential, &target)
            .await
            .map_err(|e| {
                warn!(%endpoint, error = %e, "Failed to open publisher");
                PublishError::Connection {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                }
            })?;

        let ceiling = transport.max_batch_bytes();
        if ceiling == 0 {
            let _ = transport.close();
            warn!(%endpoint, "Endpoint advertised a zero batch ceiling");
            return Err(PublishError::Connection {
                endpoint: endpoint.to_string(),
                reason: "endpoint advertised a batch ceiling of 0 bytes".to_string(),
            });
        }

        let default_batch_bytes = match max_batch_bytes {
            None => ceiling,
            Some(requested) => match validate_batch_size(requested, ceiling) {
                Ok(size) => size,
                Err(e) => {
                    // Session is already open; release it before bailing out
                    let _ = transport.close();
                    return Err(e);
                }
            },
        };

        let publisher = Self {
            id: Uuid::now_v7(),
            endpoint,
            target,
            ceiling,
            default_batch_bytes,
            send_timeout,
            transport: Some(transport),
            batches_sent: 0,
        };

        info!(
            publisher_id = %publisher.id,
            endpoint = %publisher.endpoint,
            target = %publisher.target,
            max_batch_bytes = publisher.default_batch_bytes,
            "Publisher opened"
        );

        Ok(publisher)
    }

    /// Create an empty batch bound to this publisher's routing.
    ///
    /// `None` uses the configured default (the endpoint ceiling unless
    /// overridden in `PublisherConfig`).
    pub fn create_batch(&self, max_size_bytes: Option<usize>) -> PublishResult<EventBatch> {
        self.create_batch_with(BatchOptions {
            max_size_bytes,
            target: None,
        })
    }

    /// Create an empty batch with a size and/or routing override.
    ///
    /// # Errors
    ///
    /// - `PublishError::State` if the publisher is closed
    /// - `PublishError::BatchTooLarge` if the size exceeds the endpoint ceiling
    /// - `PublishError::Config` if the size is zero
    pub fn create_batch_with(&self, options: BatchOptions) -> PublishResult<EventBatch> {
        self.ensure_open()?;

        let max_size_bytes = match options.max_size_bytes {
            Some(requested) => validate_batch_size(requested, self.ceiling)?,
            None => self.default_batch_bytes,
        };
        let target = options.target.unwrap_or_else(|| self.target.clone());

        let batch = EventBatch::new(self.id, target, max_size_bytes);
        debug!(
            publisher_id = %self.id,
            batch_id = %batch.id(),
            target = %batch.target(),
            max_size_bytes,
            "Batch created"
        );

        Ok(batch)
    }

    /// Submit a batch using the configured send timeout.
    ///
    /// See `send_batch_with_timeout`.
    pub async fn send_batch(&mut self, batch: &mut EventBatch) -> PublishResult<()> {
        let send_timeout = self.send_timeout;
        self.send_batch_with_timeout(batch, send_timeout).await
    }

    /// Submit a batch as one atomic operation.
    ///
    /// The batch is sealed before the network call, so it is sealed
    /// whatever the outcome. To retry, build a fresh batch.
    ///
    /// On timeout the in-flight attempt is dropped and `TransientSend` is
    /// returned. The endpoint may still have accepted the batch: a timeout
    /// means "outcome unknown", not "not delivered".
    ///
    /// # Errors
    ///
    /// - `PublishError::State` if the publisher is closed, or the batch is
    ///   empty, already sent, or belongs to another publisher
    /// - `PublishError::TransientSend` on network faults and timeouts
    /// - `PublishError::RejectedBatch` if the endpoint refuses the batch
    pub async fn send_batch_with_timeout(
        &mut self,
        batch: &mut EventBatch,
        send_timeout: Duration,
    ) -> PublishResult<()> {
        let transport = self.transport.as_ref().ok_or_else(|| {
            PublishError::State(format!("publisher {} is closed", self.id))
        })?;

        if batch.publisher_id() != self.id {
            return Err(PublishError::State(format!(
                "batch {} was created by publisher {}, not {}",
                batch.id(),
                batch.publisher_id(),
                self.id
            )));
        }
        if batch.is_sealed() {
            return Err(PublishError::State(format!("batch {} was already sent", batch.id())));
        }
        if batch.is_empty() {
            return Err(PublishError::State(format!("batch {} is empty", batch.id())));
        }

        let frame = batch.seal();
        let batch_id = frame.batch_id;
        let event_count = frame.len();
        let size_bytes = frame.size_bytes();
        let started = Instant::now();

        let outcome = match timeout(send_timeout, transport.send(&frame)).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(TransportError::Rejected(reason)))
            | Ok(Err(TransportError::Unauthorized(reason))) => Err(PublishError::RejectedBatch {
                batch_id,
                event_count,
                reason,
            }),
            Ok(Err(e)) => Err(PublishError::TransientSend {
                batch_id,
                event_count,
                reason: e.to_string(),
            }),
            Err(_) => Err(PublishError::TransientSend {
                batch_id,
                event_count,
                reason: format!(
                    "no response within {:?}; the endpoint may or may not have received the batch",
                    send_timeout
                ),
            }),
        };

        match &outcome {
            Ok(()) => {
                self.batches_sent += 1;
                info!(
                    publisher_id = %self.id,
                    %batch_id,
                    events = event_count,
                    bytes = size_bytes,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Batch sent"
                );
            }
            Err(e) => {
                warn!(
                    publisher_id = %self.id,
                    %batch_id,
                    events = event_count,
                    retryable = e.is_retryable(),
                    error = %e,
                    "Batch send failed"
                );
            }
        }

        outcome
    }

    /// Publish every payload, rolling into successive batches as each fills.
    ///
    /// Batches go out in order and the first failure stops the run; events
    /// in earlier batches have already been accepted.
    ///
    /// # Errors
    ///
    /// - `PublishError::PayloadTooLarge` if a payload does not fit an empty batch
    /// - any error from `create_batch` / `send_batch`
    pub async fn send_all<I>(&mut self, payloads: I) -> PublishResult<SendSummary>
    where
        I: IntoIterator<Item = EventPayload>,
    {
        let mut summary = SendSummary::default();
        let mut batch = self.create_batch(None)?;

        for payload in payloads {
            if !batch.has_room_for(&payload) {
                if batch.is_empty() {
                    return Err(PublishError::PayloadTooLarge {
                        size: payload.serialized_size(),
                        max: batch.max_size_bytes(),
                    });
                }
                self.flush_into(&mut batch, &mut summary).await?;
                batch = self.create_batch(None)?;

                if !batch.has_room_for(&payload) {
                    return Err(PublishError::PayloadTooLarge {
                        size: payload.serialized_size(),
                        max: batch.max_size_bytes(),
                    });
                }
            }
            batch.add(payload)?;
        }

        if !batch.is_empty() {
            self.flush_into(&mut batch, &mut summary).await?;
        }

        Ok(summary)
    }

    async fn flush_into(
        &mut self,
        batch: &mut EventBatch,
        summary: &mut SendSummary,
    ) -> PublishResult<()> {
        self.send_batch(batch).await?;
        summary.batches += 1;
        summary.events += batch.count();
        summary.bytes += batch.size_bytes();
        Ok(())
    }

    /// Release the session. Calling it again is a no-op.
    pub fn close(&mut self) {
        let Some(transport) = self.transport.take() else {
            return;
        };

        if let Err(e) = transport.close() {
            warn!(publisher_id = %self.id, error = %e, "Transport teardown failed");
        }

        info!(
            publisher_id = %self.id,
            endpoint = %self.endpoint,
            batches_sent = self.batches_sent,
            "Publisher closed"
        );
    }

    /// Whether `close` has run.
    pub fn is_closed(&self) -> bool {
        self.transport.is_none()
    }

    /// Publisher identifier; batches carry it.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Endpoint this publisher talks to.
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Default routing.
    pub fn target(&self) -> &PublishTarget {
        &self.target
    }

    /// Size used by `create_batch(None)`.
    pub fn max_batch_size(&self) -> usize {
        self.default_batch_bytes
    }

    /// Batches successfully sent so far.
    pub fn batches_sent(&self) -> u64 {
        self.batches_sent
    }

    fn ensure_open(&self) -> PublishResult<()> {
        if self.is_closed() {
            return Err(PublishError::State(format!("publisher {} is closed", self.id)));
        }
        Ok(())
    }
}

impl Drop for EventPublisher {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for EventPublisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPublisher")
            .field("id", &self.id)
            .field("endpoint", &self.endpoint)
            .field("target", &self.target)
            .field("max_batch_bytes", &self.default_batch_bytes)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn validate_batch_size(requested: usize, ceiling: usize) -> PublishResult<usize> {
    if requested == 0 {
        return Err(PublishError::Config("batch size must be greater than zero".to_string()));
    }
    if requested > ceiling {
        return Err(PublishError::BatchTooLarge { requested, ceiling });
    }
    Ok(requested)
}

// =============================================================================
// Tests
// =============================================================================
