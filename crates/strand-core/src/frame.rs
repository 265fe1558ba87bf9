//! Server-push frame wire type.

use serde::{Deserialize, Serialize};

use crate::ids::SessionId;

/// Default event name for application frames.
pub const MESSAGE_EVENT: &str = "message";

/// Event name of the first frame on a new stream. Its data is the
/// message-endpoint URL (with `sessionId` applied) the client must POST
/// subsequent payloads to.
pub const ENDPOINT_EVENT: &str = "endpoint";

/// One unit of server-to-client output on a push stream.
///
/// A frame maps 1:1 to an SSE event: `event` is the event name and `data`
/// its payload. The transport never inspects `data` — it belongs to the
/// application protocol riding on top.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    /// SSE event name.
    pub event: String,
    /// Opaque payload.
    pub data: String,
}

impl Frame {
    /// Create an application frame with the default `message` event name.
    pub fn message(data: impl Into<String>) -> Self {
        Self {
            event: MESSAGE_EVENT.to_owned(),
            data: data.into(),
        }
    }

    /// Create a frame with an explicit event name.
    pub fn named(event: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            data: data.into(),
        }
    }

    /// Create the stream-open handshake frame for `session`.
    ///
    /// `message_path` is the message-endpoint path (e.g. `/api/messages`);
    /// the session ID is applied as its `sessionId` query parameter.
    pub fn endpoint(message_path: &str, session: &SessionId) -> Self {
        Self {
            event: ENDPOINT_EVENT.to_owned(),
            data: format!("{message_path}?sessionId={session}"),
        }
    }

    /// Serialize a JSON value into an application frame.
    pub fn json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        Ok(Self::message(serde_json::to_string(value)?))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_frame_uses_default_event() {
        let frame = Frame::message("hello");
        assert_eq!(frame.event, "message");
        assert_eq!(frame.data, "hello");
    }

    #[test]
    fn named_frame() {
        let frame = Frame::named("status", "ok");
        assert_eq!(frame.event, "status");
        assert_eq!(frame.data, "ok");
    }

    #[test]
    fn endpoint_frame_applies_session_query_param() {
        let session = SessionId::from("s-123");
        let frame = Frame::endpoint("/api/messages", &session);
        assert_eq!(frame.event, "endpoint");
        assert_eq!(frame.data, "/api/messages?sessionId=s-123");
    }

    #[test]
    fn json_frame_serializes_payload() {
        let value = serde_json::json!({"text": "hi"});
        let frame = Frame::json(&value).unwrap();
        assert_eq!(frame.event, "message");
        let parsed: serde_json::Value = serde_json::from_str(&frame.data).unwrap();
        assert_eq!(parsed["text"], "hi");
    }

    #[test]
    fn serde_roundtrip() {
        let frame = Frame::named("message", "payload");
        let json = serde_json::to_string(&frame).unwrap();
        let back: Frame = serde_json::from_str(&json).unwrap();
        assert_eq!(back, frame);
    }
}
