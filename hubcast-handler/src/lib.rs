//! Hubcast Handler
//!
//! Consumer side: the function an event-trigger host invokes once per
//! received event.
//!
//! # Components
//!
//! - **handle**: Decode (UTF-8, then JSON), log, return the decoded event
//! - **Idempotency**: Deterministic event keys from the normalized body
//! - **IdempotentHandler**: Suppresses redeliveries under at-least-once hosts
//!
//! # Example
//!
//! ```rust
//! use hubcast_handler::{handle, Delivery, IdempotentHandler};
//!
//! let event = handle(br#"{"message":"Single message"}"#).unwrap();
//! assert_eq!(event.body["message"], "Single message");
//!
//! let handler = IdempotentHandler::new(1024);
//! assert!(matches!(handler.process(b"{\"id\":1}").unwrap(), Delivery::Fresh(_)));
//! assert!(matches!(handler.process(b"{\"id\":1}").unwrap(), Delivery::Duplicate { .. }));
//! ```

#![warn(clippy::all)]

pub mod dedup;
pub mod error;
pub mod handler;
pub mod idempotency;

pub use dedup::{DedupWindow, Delivery, IdempotentHandler};
pub use error::{HandlerError, HandlerResult};
pub use handler::{handle, ReceivedEvent};
pub use idempotency::compute_event_key;
