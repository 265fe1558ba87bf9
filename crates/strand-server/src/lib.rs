//! # strand-server
//!
//! Axum HTTP server exposing the strand streaming-session transport:
//!
//! - `GET /api/stream` — opens a long-lived SSE push stream; the first
//!   event carries the session's message-endpoint URL
//! - `POST /api/messages?sessionId=<id>` — delivers an out-of-band payload
//!   to the live stream's consumer
//! - `GET /health`, `GET /metrics` — liveness and Prometheus exposition
//! - Graceful shutdown via `CancellationToken`

#![deny(unsafe_code)]

pub mod config;
pub mod health;
pub mod messages;
pub mod metrics;
pub mod server;
pub mod shutdown;
pub mod stream;

pub use config::ServerConfig;
pub use server::{AppState, StrandServer};
pub use shutdown::ShutdownCoordinator;
