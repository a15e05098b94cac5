//! Single-event handler.
//!
//! Makes no assumption about the host's retry or concurrency behaviour;
//! wrap it in `IdempotentHandler` when the host delivers at least once.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::error::HandlerResult;
use crate::idempotency::compute_event_key;

/// A decoded event.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceivedEvent {
    /// Parsed JSON body
    pub body: serde_json::Value,
    /// Deterministic key of the body (see `compute_event_key`)
    pub event_key: String,
    /// Size of the raw body in bytes
    pub size_bytes: usize,
    /// When this process decoded the event
    pub received_at: DateTime<Utc>,
}

impl ReceivedEvent {
    /// Deserialize the body into a typed structure.
    pub fn decode_as<T: DeserializeOwned>(&self) -> HandlerResult<T> {
        Ok(serde_json::from_value(self.body.clone())?)
    }
}

/// Decode and process one event body.
///
/// The body must be UTF-8 encoded JSON. Processing is logging: the body is
/// emitted at `info` level and the decoded event is returned to the caller.
///
/// # Errors
///
/// - `HandlerError::InvalidUtf8` if the bytes are not UTF-8
/// - `HandlerError::InvalidJson` if the text is not JSON
pub fn handle(raw: &[u8]) -> HandlerResult<ReceivedEvent> {
    let text = std::str::from_utf8(raw)?;
    let body: serde_json::Value = serde_json::from_str(text)?;
    let event_key = compute_event_key(&body);

    info!(event_key = %event_key, size_bytes = raw.len(), body = %text, "Event received");

    Ok(ReceivedEvent {
        body,
        event_key,
        size_bytes: raw.len(),
        received_at: Utc::now(),
    })
}

// =============================================================================
// Tests
// =============================================================================
