//! Redelivery suppression for at-least-once hosts.
//!
//! The host may invoke the handler more than once for the same event after a
//! failure. `IdempotentHandler` remembers the keys of recently processed
//! events and reports repeats as `Delivery::Duplicate` instead of
//! processing them again.

use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, PoisonError};
use tracing::{debug, info};

use crate::error::HandlerResult;
use crate::handler::{handle, ReceivedEvent};

/// Bounded set of recently seen event keys, evicting oldest first.
#[derive(Debug)]
pub struct DedupWindow {
    capacity: usize,
    order: VecDeque<String>,
    seen: HashSet<String>,
}

impl DedupWindow {
    /// Create a window remembering up to `capacity` keys (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            seen: HashSet::with_capacity(capacity),
        }
    }

    /// Record a key. Returns `false` if it was already in the window.
    pub fn insert(&mut self, key: &str) -> bool {
        if self.seen.contains(key) {
            return false;
        }

        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.seen.remove(&oldest);
                debug!(evicted = %oldest, "Dedup window full, evicting oldest key");
            }
        }

        self.order.push_back(key.to_string());
        self.seen.insert(key.to_string());
        true
    }

    /// Whether the key is currently remembered.
    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    /// Forget a key (e.g. when downstream processing failed and a
    /// redelivery should be processed again).
    pub fn remove(&mut self, key: &str) -> bool {
        if !self.seen.remove(key) {
            return false;
        }
        self.order.retain(|k| k != key);
        true
    }

    /// Keys currently remembered.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is remembered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Outcome of `IdempotentHandler::process`.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// First time this body was seen within the window
    Fresh(ReceivedEvent),
    /// Redelivery of a body already processed
    Duplicate {
        /// Key of the repeated body
        event_key: String,
    },
}

/// `handle` plus redelivery suppression.
///
/// Safe to share across threads; the window is behind a mutex.
#[derive(Debug)]
pub struct IdempotentHandler {
    window: Mutex<DedupWindow>,
}

impl IdempotentHandler {
    /// Create a handler remembering up to `capacity` recent events.
    pub fn new(capacity: usize) -> Self {
        Self {
            window: Mutex::new(DedupWindow::new(capacity)),
        }
    }

    /// Decode one event, skipping bodies already processed.
    ///
    /// Malformed bodies are never recorded, so they fail the same way on
    /// every redelivery.
    pub fn process(&self, raw: &[u8]) -> HandlerResult<Delivery> {
        let event = handle(raw)?;

        let fresh = self
            .window
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(&event.event_key);

        if fresh {
            Ok(Delivery::Fresh(event))
        } else {
            info!(event_key = %event.event_key, "Duplicate delivery skipped");
            Ok(Delivery::Duplicate {
                event_key: event.event_key,
            })
        }
    }

    /// Forget an event so its next delivery is processed again.
    pub fn forget(&self, event_key: &str) -> bool {
        self.window
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(event_key)
    }

    /// Number of event keys remembered.
    pub fn remembered(&self) -> usize {
        self.window.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

// =============================================================================
// Tests
// =============================================================================
