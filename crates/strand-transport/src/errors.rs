//! Transport error types.

use strand_core::SessionId;

/// Error writing a frame to a connection.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SendError {
    /// The handle is not accepting writes (closing or closed).
    #[error("connection is not open")]
    NotOpen,

    /// The underlying stream's write task is gone. Unrecoverable; the
    /// handle begins its close transition when this is first observed.
    #[error("transport channel closed")]
    ChannelClosed,
}

/// Error mutating the session registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// An entry already exists for the session ID. With randomly minted
    /// IDs this indicates an internal invariant violation, not a caller
    /// mistake.
    #[error("session {0} is already registered")]
    DuplicateSession(SessionId),
}

/// Error returned by a consumer that failed to process one payload.
///
/// Local to the one message: the connection stays open.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ConsumerError {
    /// What went wrong.
    pub message: String,
}

impl ConsumerError {
    /// Create a consumer error from a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
