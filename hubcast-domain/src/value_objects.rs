//! Value Objects for the Hubcast Domain
//!
//! Immutable, validated domain primitives.
//! All value objects enforce invariants at construction time.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Domain errors for value object validation
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Event body must carry at least one byte
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// Endpoint address must be non-empty
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    /// Partition id / key validation error
    #[error("Invalid partition target: {0}")]
    InvalidTarget(String),

    /// Credential validation error
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),
}

// =============================================================================
// EventPayload
// =============================================================================

/// One unit of data to transmit to the ingestion endpoint.
///
/// # Invariants
/// - Body must be non-empty
///
/// The body is opaque to Hubcast. Cloning is cheap (`Bytes` is reference counted),
/// so a payload can sit in a batch and in a transport frame at the same time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPayload {
    body: Bytes,
    partition_key: Option<String>,
    properties: BTreeMap<String, String>,
}

impl EventPayload {
    /// Create a new payload with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPayload` if the body is empty
    pub fn new(body: impl Into<Bytes>) -> Result<Self, DomainError> {
        let body = body.into();
        if body.is_empty() {
            return Err(DomainError::InvalidPayload("Event body must be non-empty".to_string()));
        }
        Ok(Self {
            body,
            partition_key: None,
            properties: BTreeMap::new(),
        })
    }

    /// Create a payload from UTF-8 text
    pub fn from_text(text: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(text.into().into_bytes())
    }

    /// Attach a partition key routing hint
    pub fn with_partition_key(mut self, key: impl Into<String>) -> Self {
        self.partition_key = Some(key.into());
        self
    }

    /// Attach an application property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Raw body bytes
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Partition key hint, if any
    pub fn partition_key(&self) -> Option<&str> {
        self.partition_key.as_deref()
    }

    /// Application properties, ordered by key
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Bytes this payload contributes to a batch.
    ///
    /// Body + partition key + every property key and value.
    /// Transport framing is not counted.
    pub fn serialized_size(&self) -> usize {
        let key_len = self.partition_key.as_ref().map_or(0, |k| k.len());
        let props_len: usize = self.properties.iter().map(|(k, v)| k.len() + v.len()).sum();
        self.body.len() + key_len + props_len
    }
}

// =============================================================================
// PublishTarget
// =============================================================================

/// Routing for a publisher or a single batch.
///
/// `RoundRobin` leaves partition selection to the endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PublishTarget {
    /// Endpoint distributes batches across partitions
    #[default]
    RoundRobin,
    /// Fixed partition
    PartitionId(String),
    /// Endpoint hashes the key to pick a partition
    PartitionKey(String),
}

impl PublishTarget {
    /// Target a fixed partition
    ///
    /// # Errors
    /// Returns `DomainError::InvalidTarget` if the id is empty
    pub fn partition_id(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(DomainError::InvalidTarget("Partition id must be non-empty".to_string()));
        }
        Ok(Self::PartitionId(id))
    }

    /// Target whatever partition the key hashes to
    ///
    /// # Errors
    /// Returns `DomainError::InvalidTarget` if the key is empty
    pub fn partition_key(key: impl Into<String>) -> Result<Self, DomainError> {
        let key = key.into();
        if key.is_empty() {
            return Err(DomainError::InvalidTarget("Partition key must be non-empty".to_string()));
        }
        Ok(Self::PartitionKey(key))
    }

    /// Build a target from optional id and key settings.
    ///
    /// # Errors
    /// Returns `DomainError::InvalidTarget` if both are set
    pub fn from_parts(
        partition_id: Option<String>,
        partition_key: Option<String>,
    ) -> Result<Self, DomainError> {
        match (partition_id, partition_key) {
            (Some(_), Some(_)) => Err(DomainError::InvalidTarget(
                "Partition id and partition key are mutually exclusive".to_string(),
            )),
            (Some(id), None) => Self::partition_id(id),
            (None, Some(key)) => Self::partition_key(key),
            (None, None) => Ok(Self::RoundRobin),
        }
    }

    /// Partition id, if this targets a fixed partition
    pub fn as_partition_id(&self) -> Option<&str> {
        match self {
            Self::PartitionId(id) => Some(id),
            _ => None,
        }
    }

    /// Partition key, if this routes by key
    pub fn as_partition_key(&self) -> Option<&str> {
        match self {
            Self::PartitionKey(key) => Some(key),
            _ => None,
        }
    }
}

impl fmt::Display for PublishTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RoundRobin => write!(f, "round-robin"),
            Self::PartitionId(id) => write!(f, "partition:{}", id),
            Self::PartitionKey(key) => write!(f, "key:{}", key),
        }
    }
}

// =============================================================================
// Endpoint
// =============================================================================

/// Address of the ingestion endpoint.
///
/// # Invariants
/// - Non-empty after trimming
/// - No trailing slash
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint(String);

impl Endpoint {
    /// Create a new Endpoint with validation
    ///
    /// # Errors
    /// Returns `DomainError::InvalidEndpoint` if the address is blank
    pub fn new(address: impl AsRef<str>) -> Result<Self, DomainError> {
        let trimmed = address.as_ref().trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(DomainError::InvalidEndpoint(
                "Endpoint address must be non-empty".to_string(),
            ));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Address as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Tests
// =============================================================================
