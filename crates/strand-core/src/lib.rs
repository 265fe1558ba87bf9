//! # strand-core
//!
//! Foundation types for the strand streaming-session transport:
//! session identifiers and the frame wire type shared by the transport
//! and server crates.

#![deny(unsafe_code)]

pub mod frame;
pub mod ids;

pub use frame::{ENDPOINT_EVENT, Frame, MESSAGE_EVENT};
pub use ids::SessionId;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
