//! # strand-transport
//!
//! The streaming-session transport core: connection handles, the
//! process-wide session registry, and inbound message routing.
//!
//! A client opens a long-lived push stream and receives a session
//! identifier as the first frame. Subsequent plain HTTP requests carry
//! that identifier out of band and are routed back to the live stream's
//! consumer, which may push response frames down the original stream —
//! a bidirectional protocol over request/response HTTP.

#![deny(unsafe_code)]

pub mod connection;
pub mod errors;
pub mod registry;
pub mod router;

pub use connection::{CloseCallback, ConnectionHandle, ConnectionState, ErrorCallback};
pub use errors::{ConsumerError, RegistryError, SendError};
pub use registry::SessionRegistry;
pub use router::{DeliveryOutcome, InboundRouter, MessageConsumer};
