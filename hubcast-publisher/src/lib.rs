//! Hubcast Publisher
//!
//! Provider-agnostic event publishing with size-bounded batches.
//!
//! # Architecture
//!
//! ```text
//! Caller → EventPublisher → EventBatch → IngestTransport → Endpoint
//!               ↑
//!           Connector (stub, HTTP, vendor SDK adapter)
//! ```
//!
//! # Components
//!
//! - **Ports**: `Connector` / `IngestTransport` traits isolating the provider
//! - **Publisher**: Session lifecycle, batch creation, atomic submission with timeout
//! - **Batch**: Byte-budgeted accumulation with a non-error "doesn't fit" signal
//! - **Stub**: In-memory endpoint for tests and local runs
//! - **HTTP**: Provider-neutral JSON-over-HTTP adapter
//!
//! # Example
//!
//! ```rust,ignore
//! use hubcast_domain::{Credential, Endpoint, EventPayload};
//! use hubcast_publisher::{EventPublisher, PublisherConfig, StubConnector};
//!
//! let config = PublisherConfig::new(
//!     Endpoint::new("stub://local")?,
//!     Credential::token("token")?,
//! );
//! let mut publisher = EventPublisher::open(config, &StubConnector::new()).await?;
//!
//! let mut batch = publisher.create_batch(None)?;
//! batch.add(EventPayload::from_text("Single message")?)?;
//! publisher.send_batch(&mut batch).await?;
//! // Session released when `publisher` goes out of scope
//! ```

#![warn(clippy::all)]

pub mod batch;
pub mod config;
pub mod error;
pub mod http;
pub mod ports;
pub mod publisher;
pub mod stub;

// Re-exports for convenience
pub use batch::{BatchOptions, EventBatch};
pub use config::{PublisherConfig, DEFAULT_SEND_TIMEOUT};
pub use error::{PublishError, PublishResult};
pub use http::{HttpConnector, HttpTransport, WireBatch, WireEvent, DEFAULT_CONNECT_TIMEOUT};
pub use ports::{BatchFrame, Connector, IngestTransport, TransportError, DEFAULT_MAX_BATCH_BYTES};
pub use publisher::{EventPublisher, SendSummary};
pub use stub::{StubConnector, StubOutcome, StubTransport};
