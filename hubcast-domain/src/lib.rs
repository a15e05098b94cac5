//! Hubcast Domain Layer
//!
//! Pure value types with zero I/O dependencies.
//! Shared by the publisher (producer side) and the handler (consumer side).

#![warn(missing_docs)]
#![warn(clippy::all)]

// Public modules
pub mod credentials;
pub mod value_objects;

// Re-export commonly used types
pub use credentials::Credential;
pub use value_objects::{DomainError, Endpoint, EventPayload, PublishTarget};
