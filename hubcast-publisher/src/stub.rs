//! Stub implementations for testing.
//!
//! These implementations simulate an ingestion endpoint in memory
//! without making real network calls.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use hubcast_domain::{Credential, Endpoint, PublishTarget};

use crate::ports::{BatchFrame, Connector, IngestTransport, TransportError, DEFAULT_MAX_BATCH_BYTES};

// =============================================================================
// Scripted Outcomes
// =============================================================================

/// What the stub endpoint does with the next batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubOutcome {
    /// Accept and record the batch
    Accept,
    /// Fail with a network error
    Fail(String),
    /// Refuse the batch
    Reject(String),
    /// Never answer
    Hang,
}

/// Shared state between a connector, its transports and the test.
#[derive(Default)]
struct StubState {
    /// Frames accepted, in arrival order
    delivered: RwLock<Vec<BatchFrame>>,
    /// Outcomes for upcoming sends (accept when empty)
    script: RwLock<VecDeque<StubOutcome>>,
    /// Sessions opened
    connects: RwLock<usize>,
    /// Sessions torn down
    closes: RwLock<usize>,
}

// =============================================================================
// Stub Connector
// =============================================================================

/// Stub endpoint for testing.
///
/// Accepts every batch unless told otherwise.
pub struct StubConnector {
    state: Arc<StubState>,
    /// Whether `connect` succeeds at all
    reachable: bool,
    /// Only this secret is accepted when set
    accepted_secret: Option<String>,
    /// Ceiling advertised to publishers
    max_batch_bytes: usize,
}

impl StubConnector {
    /// Create a reachable stub that accepts any credential.
    pub fn new() -> Self {
        Self {
            state: Arc::new(StubState::default()),
            reachable: true,
            accepted_secret: None,
            max_batch_bytes: DEFAULT_MAX_BATCH_BYTES,
        }
    }

    /// Simulate an endpoint that never answers `connect`.
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::new()
        }
    }

    /// Refuse every credential except this secret.
    pub fn accepting_only(mut self, secret: impl Into<String>) -> Self {
        self.accepted_secret = Some(secret.into());
        self
    }

    /// Advertise a different batch ceiling.
    pub fn with_max_batch_bytes(mut self, max_batch_bytes: usize) -> Self {
        self.max_batch_bytes = max_batch_bytes;
        self
    }

    /// Queue the outcome for the next unscripted send.
    pub fn push_outcome(&self, outcome: StubOutcome) {
        write(&self.state.script).push_back(outcome);
    }

    /// Frames accepted so far, in arrival order.
    pub fn delivered(&self) -> Vec<BatchFrame> {
        read(&self.state.delivered).clone()
    }

    /// Number of sessions opened.
    pub fn connect_count(&self) -> usize {
        *read(&self.state.connects)
    }

    /// Number of sessions torn down.
    pub fn close_count(&self) -> usize {
        *read(&self.state.closes)
    }
}

impl Default for StubConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for StubConnector {
    async fn connect(
        &self,
        endpoint: &Endpoint,
        credential: &Credential,
        target: &PublishTarget,
    ) -> Result<Box<dyn IngestTransport>, TransportError> {
        if !self.reachable {
            return Err(TransportError::Unreachable(format!("{} did not answer", endpoint)));
        }

        if let Some(expected) = &self.accepted_secret {
            if credential.expose_secret() != expected {
                return Err(TransportError::Unauthorized(format!(
                    "{} refused the credential",
                    endpoint
                )));
            }
        }

        *write(&self.state.connects) += 1;
        tracing::debug!(%endpoint, %target, "Stub: session opened");

        Ok(Box::new(StubTransport {
            state: Arc::clone(&self.state),
            max_batch_bytes: self.max_batch_bytes,
            closed: AtomicBool::new(false),
        }))
    }
}

// =============================================================================
// Stub Transport
// =============================================================================

/// Session handed out by `StubConnector`.
pub struct StubTransport {
    state: Arc<StubState>,
    max_batch_bytes: usize,
    closed: AtomicBool,
}

#[async_trait]
impl IngestTransport for StubTransport {
    fn max_batch_bytes(&self) -> usize {
        self.max_batch_bytes
    }

    async fn send(&self, frame: &BatchFrame) -> Result<(), TransportError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }

        // Pop before awaiting; the guard must not live across `.await`
        let outcome = write(&self.state.script).pop_front().unwrap_or(StubOutcome::Accept);

        match outcome {
            StubOutcome::Accept => {
                write(&self.state.delivered).push(frame.clone());
                tracing::debug!(batch_id = %frame.batch_id, events = frame.len(), "Stub: batch accepted");
                Ok(())
            }
            StubOutcome::Fail(reason) => Err(TransportError::Network(reason)),
            StubOutcome::Reject(reason) => Err(TransportError::Rejected(reason)),
            StubOutcome::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }

    fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        *write(&self.state.closes) += 1;
        tracing::debug!("Stub: session closed");
        Ok(())
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Tests
// =============================================================================
