//! Message endpoint — delivers out-of-band payloads to live streams.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use metrics::counter;
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use strand_core::SessionId;
use strand_transport::DeliveryOutcome;

use crate::metrics::INBOUND_MESSAGES_TOTAL;
use crate::server::AppState;

/// Query parameters of the message endpoint.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    /// Session the payload is addressed to.
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// `POST /api/messages?sessionId=<id>`
///
/// The caller always receives a definite outcome: `200` delivered, `404`
/// unknown session, `500` processing failure, `400` malformed request,
/// `401` unauthenticated.
#[instrument(skip_all, fields(session_id))]
pub async fn message_handler(
    State(state): State<AppState>,
    Query(query): Query<MessageQuery>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let ctx = AppState::request_context(&headers);
    if !state.authenticator.is_authenticated(&ctx) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    let Some(session_id) = query.session_id.filter(|id| !id.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "missing sessionId").into_response();
    };
    let _ = tracing::Span::current().record("session_id", session_id.as_str());

    let Ok(Json(payload)) = payload else {
        return (StatusCode::BAD_REQUEST, "body must be JSON").into_response();
    };

    let session = SessionId::from_string(session_id);
    match state.inbound.deliver(&session, payload).await {
        DeliveryOutcome::Delivered => {
            counter!(INBOUND_MESSAGES_TOTAL, "outcome" => "delivered").increment(1);
            StatusCode::OK.into_response()
        }
        DeliveryOutcome::UnknownSession => {
            counter!(INBOUND_MESSAGES_TOTAL, "outcome" => "unknown_session").increment(1);
            StatusCode::NOT_FOUND.into_response()
        }
        DeliveryOutcome::Failed(err) => {
            counter!(INBOUND_MESSAGES_TOTAL, "outcome" => "failed").increment(1);
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()).into_response()
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
