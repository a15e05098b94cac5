//! Size-bounded event batches.

use tracing::debug;
use uuid::Uuid;

use hubcast_domain::{EventPayload, PublishTarget};

use crate::error::{PublishError, PublishResult};
use crate::ports::BatchFrame;

/// Options for `EventPublisher::create_batch_with`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Maximum serialized size; defaults to the publisher's batch size
    pub max_size_bytes: Option<usize>,
    /// Routing override; defaults to the publisher's target
    pub target: Option<PublishTarget>,
}

impl BatchOptions {
    /// Set the maximum serialized size.
    pub fn with_max_size_bytes(mut self, max_size_bytes: usize) -> Self {
        self.max_size_bytes = Some(max_size_bytes);
        self
    }

    /// Route this batch differently from the publisher default.
    pub fn with_target(mut self, target: PublishTarget) -> Self {
        self.target = Some(target);
        self
    }
}

/// An ordered group of payloads destined for one atomic submission.
///
/// # Invariants
/// - `size_bytes() <= max_size_bytes()` at all times
/// - Once sealed (sent, successfully or not) no further mutation is allowed
#[derive(Debug)]
pub struct EventBatch {
    id: Uuid,
    publisher_id: Uuid,
    target: PublishTarget,
    max_size_bytes: usize,
    size_bytes: usize,
    events: Vec<EventPayload>,
    sealed: bool,
}

impl EventBatch {
    pub(crate) fn new(publisher_id: Uuid, target: PublishTarget, max_size_bytes: usize) -> Self {
        Self {
            id: Uuid::now_v7(),
            publisher_id,
            target,
            max_size_bytes,
            size_bytes: 0,
            events: Vec::new(),
            sealed: false,
        }
    }

    /// Append a payload if it fits.
    ///
    /// Returns `Ok(false)` without touching the batch when the payload would
    /// push the batch over its maximum. That is a capacity signal, not an
    /// error: start a new batch and add the payload there.
    ///
    /// # Errors
    /// `PublishError::State` if the batch is sealed.
    pub fn add(&mut self, payload: EventPayload) -> PublishResult<bool> {
        if self.sealed {
            return Err(PublishError::State(format!("batch {} is sealed", self.id)));
        }

        if !self.has_room_for(&payload) {
            debug!(
                batch_id = %self.id,
                payload_bytes = payload.serialized_size(),
                size_bytes = self.size_bytes,
                max_size_bytes = self.max_size_bytes,
                "Payload does not fit batch"
            );
            return Ok(false);
        }

        self.size_bytes += payload.serialized_size();
        self.events.push(payload);
        Ok(true)
    }

    /// Whether `add` would accept this payload right now.
    pub fn has_room_for(&self, payload: &EventPayload) -> bool {
        !self.sealed && payload.serialized_size() <= self.remaining_bytes()
    }

    /// Bytes still available before hitting the maximum.
    pub fn remaining_bytes(&self) -> usize {
        self.max_size_bytes - self.size_bytes
    }

    /// Number of payloads.
    pub fn count(&self) -> usize {
        self.events.len()
    }

    /// Cumulative serialized size.
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Configured maximum serialized size.
    pub fn max_size_bytes(&self) -> usize {
        self.max_size_bytes
    }

    /// Whether the batch holds no payloads.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Whether the batch has been handed to a publisher for sending.
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Batch identifier.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Publisher that created this batch.
    pub fn publisher_id(&self) -> Uuid {
        self.publisher_id
    }

    /// Routing for this batch.
    pub fn target(&self) -> &PublishTarget {
        &self.target
    }

    /// Payloads in insertion order.
    pub fn events(&self) -> &[EventPayload] {
        &self.events
    }

    /// Seal the batch and build the transport frame.
    pub(crate) fn seal(&mut self) -> BatchFrame {
        self.sealed = true;
        BatchFrame {
            batch_id: self.id,
            publisher_id: self.publisher_id,
            target: self.target.clone(),
            events: self.events.clone(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(len: usize) -> EventPayload {
        EventPayload::new(vec![b'x'; len]).unwrap()
    }

    fn batch(max: usize) -> EventBatch {
        EventBatch::new(Uuid::now_v7(), PublishTarget::RoundRobin, max)
    }

    #[test]
    fn test_add_within_budget() {
        let mut batch = batch(1024);

        assert!(batch.add(payload(100)).unwrap());
        assert_eq!(batch.count(), 1);
        assert_eq!(batch.size_bytes(), 100);
        assert_eq!(batch.remaining_bytes(), 924);
    }

    #[test]
    fn test_add_oversized_payload_does_not_mutate() {
        let mut batch = batch(1024);
        batch.add(payload(100)).unwrap();

        assert!(!batch.add(payload(2000)).unwrap());
        assert_eq!(batch.count(), 1);
        assert_eq!(batch.size_bytes(), 100);
    }

    #[test]
    fn test_smaller_payload_fits_after_rejection() {
        let mut batch = batch(250);

        assert!(batch.add(payload(200)).unwrap());
        assert!(!batch.add(payload(100)).unwrap());
        assert!(batch.add(payload(50)).unwrap());

        assert_eq!(batch.count(), 2);
        assert_eq!(batch.size_bytes(), 250);
        assert_eq!(batch.remaining_bytes(), 0);
    }

    #[test]
    fn test_size_never_exceeds_maximum() {
        let mut batch = batch(1000);

        for len in [1, 7, 300, 999, 42, 512, 128, 3, 64, 250, 1] {
            let _ = batch.add(payload(len)).unwrap();
            assert!(batch.size_bytes() <= batch.max_size_bytes());
        }

        let total: usize = batch.events().iter().map(EventPayload::serialized_size).sum();
        assert_eq!(total, batch.size_bytes());
    }

    #[test]
    fn test_size_bound_holds_at_the_boundary() {
        let sequences: [&[usize]; 4] = [
            // Exactly fills the budget, then nothing more fits
            &[600, 400, 1],
            // One byte over the remaining budget, then exactly the remainder
            &[999, 2, 1],
            // Single payload of exactly the maximum
            &[1000, 1],
            // One byte over the maximum on an empty batch
            &[1001, 1000],
        ];
        let expected_sizes = [1000, 1000, 1000, 1000];

        for (sizes, expected) in sequences.iter().zip(expected_sizes) {
            let mut batch = batch(1000);
            for &len in sizes.iter() {
                let fits = len <= batch.remaining_bytes();
                assert_eq!(batch.add(payload(len)).unwrap(), fits, "sequence {:?}", sizes);
                assert!(batch.size_bytes() <= batch.max_size_bytes());
            }
            assert_eq!(batch.size_bytes(), expected, "sequence {:?}", sizes);
        }
    }

    #[test]
    fn test_sealed_batch_rejects_add() {
        let mut batch = batch(1024);
        batch.add(payload(10)).unwrap();

        let frame = batch.seal();
        assert_eq!(frame.batch_id, batch.id());
        assert_eq!(frame.len(), 1);

        assert!(batch.is_sealed());
        assert!(matches!(batch.add(payload(10)), Err(PublishError::State(_))));
        assert!(!batch.has_room_for(&payload(1)));
        // Introspection still works after sealing
        assert_eq!(batch.count(), 1);
        assert_eq!(batch.size_bytes(), 10);
    }

    #[test]
    fn test_batch_options_builder() {
        let options = BatchOptions::default()
            .with_max_size_bytes(512)
            .with_target(PublishTarget::PartitionId("1".to_string()));

        assert_eq!(options.max_size_bytes, Some(512));
        assert_eq!(options.target.unwrap().as_partition_id(), Some("1"));
    }
}
