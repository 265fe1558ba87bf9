//! Demo echo consumer — the stand-in application riding on the transport.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use strand_core::{Frame, SessionId};
use strand_transport::{ConsumerError, MessageConsumer, SessionRegistry};

/// Echoes every inbound payload back down the session's stream, wrapped
/// in a small envelope with a server timestamp.
pub struct EchoConsumer {
    registry: Arc<SessionRegistry>,
}

impl EchoConsumer {
    /// Create an echo consumer over the registry.
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl MessageConsumer for EchoConsumer {
    async fn on_message(
        &self,
        session: &SessionId,
        payload: serde_json::Value,
    ) -> Result<(), ConsumerError> {
        let handle = self
            .registry
            .lookup(session)
            .ok_or_else(|| ConsumerError::new("session is gone"))?;
        let envelope = serde_json::json!({
            "type": "echo",
            "receivedAt": chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            "payload": payload,
        });
        let frame = Frame::json(&envelope).map_err(|e| ConsumerError::new(e.to_string()))?;
        debug!(session_id = %session, "echoing payload");
        handle
            .send(frame)
            .await
            .map_err(|e| ConsumerError::new(e.to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
