//! Inbound message routing.
//!
//! Inbound messages arrive out of band from the stream they target: a
//! plain HTTP request carrying a session ID and a payload. The router
//! resolves the ID against the registry and hands the payload to the live
//! connection's consumer.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use strand_core::SessionId;

use crate::errors::ConsumerError;
use crate::registry::SessionRegistry;

/// Application-side receiver of inbound payloads for a session.
///
/// The payload is opaque to the transport; consumers own its semantics.
/// A consumer that needs to push response frames back down the stream
/// holds the registry and uses `lookup(id)?.send(frame)`.
#[async_trait]
pub trait MessageConsumer: Send + Sync {
    /// Process one inbound payload for `session`.
    ///
    /// Failure is local to this one message: the connection stays open and
    /// the caller of the message endpoint is told the processing failed.
    async fn on_message(
        &self,
        session: &SessionId,
        payload: serde_json::Value,
    ) -> Result<(), ConsumerError>;
}

/// Result of routing one inbound message.
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// The consumer processed the payload.
    Delivered,
    /// No live connection for the session ID. Expected and non-fatal:
    /// the stream already closed, or the caller used a stale identifier.
    UnknownSession,
    /// The consumer failed while processing. The connection stays open.
    Failed(ConsumerError),
}

/// Routes inbound messages to live connections.
pub struct InboundRouter {
    registry: Arc<SessionRegistry>,
}

impl InboundRouter {
    /// Create a router over the given registry.
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }

    /// Deliver `payload` to the consumer of the session's live connection.
    ///
    /// Deliveries for the same session are processed one at a time (the
    /// handle's delivery lock), preserving causal order of effects on that
    /// stream; independent sessions deliver concurrently. The registry
    /// lock is never held across the consumer call.
    #[instrument(skip(self, payload), fields(session_id = %session))]
    pub async fn deliver(
        &self,
        session: &SessionId,
        payload: serde_json::Value,
    ) -> DeliveryOutcome {
        let Some(handle) = self.registry.lookup(session) else {
            debug!("message for unknown session");
            return DeliveryOutcome::UnknownSession;
        };

        let _serialized = handle.delivery_lock().lock().await;
        // The stream may have closed while this delivery waited its turn.
        if !handle.is_open() {
            debug!("session closed before delivery");
            return DeliveryOutcome::UnknownSession;
        }

        match handle.consumer().on_message(session, payload).await {
            Ok(()) => DeliveryOutcome::Delivered,
            Err(err) => {
                warn!(error = %err, "consumer failed to process message");
                DeliveryOutcome::Failed(err)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
