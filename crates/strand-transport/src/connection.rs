//! Connection handle — owns one open push stream's write path and lifecycle.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use strand_core::{Frame, SessionId};

use crate::errors::SendError;
use crate::router::MessageConsumer;

/// Lifecycle state of a [`ConnectionHandle`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionState {
    /// Accepting writes; registered.
    Open,
    /// Close initiated; no further writes accepted.
    Closing,
    /// Terminal; callbacks fired, resources released.
    Closed,
}

/// Handler invoked exactly once when the handle reaches `Closed`.
pub type CloseCallback = Box<dyn FnOnce(&SessionId) + Send>;

/// Handler invoked at most once, on the first unrecoverable write error.
pub type ErrorCallback = Box<dyn FnOnce(&SessionId, &SendError) + Send>;

/// Represents one open push stream.
///
/// The handle exclusively owns the stream's transport sink: all outbound
/// frames pass through [`ConnectionHandle::send`], which serializes
/// concurrent producers so frame boundaries never interleave. Exactly one
/// handle exists per open session.
pub struct ConnectionHandle {
    /// Session this stream is addressed by. Immutable for the handle's life.
    session_id: SessionId,
    /// Send half of the stream's write channel; the stream's write task
    /// holds the receive half. Dropped on close so the write task can
    /// drain what was queued and terminate.
    tx: Mutex<Option<mpsc::Sender<Frame>>>,
    state: Mutex<ConnectionState>,
    on_close: Mutex<Option<CloseCallback>>,
    on_error: Mutex<Option<ErrorCallback>>,
    /// Consumer receiving inbound payloads routed to this session.
    consumer: Arc<dyn MessageConsumer>,
    /// Held by the router for the duration of one delivery, so at most one
    /// inbound message is processed at a time per session.
    delivery_lock: tokio::sync::Mutex<()>,
    opened_at: Instant,
}

impl ConnectionHandle {
    /// Create a handle in state `Open`.
    pub fn new(
        session_id: SessionId,
        tx: mpsc::Sender<Frame>,
        consumer: Arc<dyn MessageConsumer>,
    ) -> Self {
        Self {
            session_id,
            tx: Mutex::new(Some(tx)),
            state: Mutex::new(ConnectionState::Open),
            on_close: Mutex::new(None),
            on_error: Mutex::new(None),
            consumer,
            delivery_lock: tokio::sync::Mutex::new(()),
            opened_at: Instant::now(),
        }
    }

    /// The session this stream is addressed by.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.state.lock()
    }

    /// Whether the handle is accepting writes.
    pub fn is_open(&self) -> bool {
        self.state() == ConnectionState::Open
    }

    /// Register the close handler. Replaces any previous one.
    pub fn set_on_close(&self, callback: CloseCallback) {
        *self.on_close.lock() = Some(callback);
    }

    /// Register the error handler. Replaces any previous one.
    pub fn set_on_error(&self, callback: ErrorCallback) {
        *self.on_error.lock() = Some(callback);
    }

    /// The consumer receiving inbound payloads for this session.
    pub fn consumer(&self) -> &Arc<dyn MessageConsumer> {
        &self.consumer
    }

    /// Lock serializing inbound deliveries for this session.
    pub fn delivery_lock(&self) -> &tokio::sync::Mutex<()> {
        &self.delivery_lock
    }

    /// Write a frame to the stream.
    ///
    /// Waits for channel capacity rather than dropping; concurrent callers
    /// are serialized by the channel, one whole frame at a time. Fails with
    /// [`SendError::NotOpen`] once a close has begun. A closed channel means
    /// the write task is gone: the error handler fires (once) and the
    /// handle begins its close transition.
    pub async fn send(&self, frame: Frame) -> Result<(), SendError> {
        if !self.is_open() {
            return Err(SendError::NotOpen);
        }
        // Clone out of the lock: the channel send may suspend.
        let Some(tx) = self.tx.lock().clone() else {
            return Err(SendError::NotOpen);
        };
        if tx.send(frame).await.is_err() {
            let err = SendError::ChannelClosed;
            self.fail(&err);
            return Err(err);
        }
        Ok(())
    }

    /// Close the stream.
    ///
    /// Idempotent: the first call transitions to `Closed`, releases the
    /// transport sink (the write task drains frames already queued, then
    /// terminates), and fires the close handler; later calls are no-ops.
    pub fn close(&self) {
        {
            let mut state = self.state.lock();
            if *state == ConnectionState::Closed {
                return;
            }
            *state = ConnectionState::Closed;
        }
        let _ = self.tx.lock().take();
        debug!(session_id = %self.session_id, "connection closed");
        // Fired outside the state lock: the handler may re-enter the
        // registry (removal) or inspect this handle.
        if let Some(callback) = self.on_close.lock().take() {
            callback(&self.session_id);
        }
    }

    /// Record the first unrecoverable write error and begin closing.
    fn fail(&self, err: &SendError) {
        {
            let mut state = self.state.lock();
            if *state == ConnectionState::Open {
                *state = ConnectionState::Closing;
            }
        }
        if let Some(callback) = self.on_error.lock().take() {
            callback(&self.session_id, err);
        }
        self.close();
    }

    /// How long the stream has been open.
    pub fn age(&self) -> Duration {
        self.opened_at.elapsed()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
