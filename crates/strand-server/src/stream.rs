//! Stream endpoint — establishes push streams and funnels every
//! disconnect path into the connection close transition.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use metrics::{counter, gauge, histogram};
use tokio::sync::mpsc;
use tracing::{error, info, instrument, warn};

use strand_core::{Frame, SessionId};
use strand_transport::{ConnectionHandle, RegistryError};

use crate::metrics::{
    FRAMES_SENT_TOTAL, STREAM_CONNECTIONS_TOTAL, STREAM_DISCONNECTIONS_TOTAL,
    STREAM_DURATION_SECONDS, STREAMS_ACTIVE,
};
use crate::server::AppState;

/// Attempts at minting a session ID before giving up on a stream-open.
/// More than one iteration means the random ID space collided, which is
/// an internal invariant violation worth the error log.
const MINT_ATTEMPTS: usize = 8;

/// `GET /api/stream`
///
/// Opens the push stream: mints a session ID, registers a connection
/// handle, and responds with an SSE body whose first event carries the
/// session's message-endpoint URL. The response stays open for the life
/// of the connection.
#[instrument(skip_all)]
pub async fn stream_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let ctx = AppState::request_context(&headers);
    if !state.authenticator.is_authenticated(&ctx) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let (tx, rx) = mpsc::channel(state.config.channel_capacity);

    // Mint-and-register loop: `register` is the atomic uniqueness check,
    // so the ID is guaranteed absent immediately before insertion.
    let mut registered = None;
    for _ in 0..MINT_ATTEMPTS {
        let candidate = Arc::new(ConnectionHandle::new(
            SessionId::new(),
            tx.clone(),
            state.consumer.clone(),
        ));
        match state.registry.register(candidate.clone()) {
            Ok(()) => {
                registered = Some(candidate);
                break;
            }
            Err(RegistryError::DuplicateSession(id)) => {
                error!(session_id = %id, "session id collision; regenerating");
            }
        }
    }
    drop(tx);
    let Some(handle) = registered else {
        // Fatal to this stream-open attempt only; the caller never sees a
        // half-registered session.
        error!("could not mint a unique session id; refusing stream");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let session_id = handle.session_id().clone();
    info!(session_id = %session_id, "stream opened");
    counter!(STREAM_CONNECTIONS_TOTAL).increment(1);
    gauge!(STREAMS_ACTIVE).increment(1.0);

    // Every close path removes the registry entry; removal is idempotent,
    // so racing disconnect paths are safe.
    let registry = state.registry.clone();
    handle.set_on_close(Box::new(move |id| {
        registry.remove(id);
        counter!(STREAM_DISCONNECTIONS_TOTAL).increment(1);
        gauge!(STREAMS_ACTIVE).decrement(1.0);
    }));
    handle.set_on_error(Box::new(|id, err| {
        warn!(session_id = %id, error = %err, "stream write error");
    }));

    let endpoint = Frame::endpoint(&state.config.message_path, &session_id);
    let keep_alive_secs = state.config.keep_alive_secs;
    let sse = Sse::new(outbound_stream(handle, rx, endpoint));
    if keep_alive_secs > 0 {
        sse.keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(keep_alive_secs))
                .text("keep-alive"),
        )
        .into_response()
    } else {
        sse.into_response()
    }
}

/// The SSE body: the endpoint handshake first, then frames as the handle
/// accepts them. The body owns the handle via a guard, so dropping it
/// (client disconnect, server error, shutdown) closes the connection.
fn outbound_stream(
    handle: Arc<ConnectionHandle>,
    mut rx: mpsc::Receiver<Frame>,
    endpoint: Frame,
) -> impl futures::Stream<Item = Result<Event, Infallible>> {
    let guard = DisconnectGuard { handle };
    async_stream::stream! {
        let _guard = guard;
        yield Ok(sse_event(&endpoint));
        while let Some(frame) = rx.recv().await {
            counter!(FRAMES_SENT_TOTAL).increment(1);
            yield Ok(sse_event(&frame));
        }
        // rx finished: the handle closed and queued frames are drained.
    }
}

/// Map a frame to its SSE representation.
fn sse_event(frame: &Frame) -> Event {
    Event::default().event(&frame.event).data(&frame.data)
}

/// Funnels every stream-termination path into `close()`.
struct DisconnectGuard {
    handle: Arc<ConnectionHandle>,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        histogram!(STREAM_DURATION_SECONDS).record(self.handle.age().as_secs_f64());
        info!(session_id = %self.handle.session_id(), "stream disconnected");
        self.handle.close();
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
