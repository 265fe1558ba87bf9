//! `StrandServer` — Axum HTTP server wiring the transport endpoints.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use strand_auth::{Authenticator, RequestContext};
use strand_transport::{InboundRouter, MessageConsumer, SessionRegistry};

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::shutdown::ShutdownCoordinator;
use crate::{messages, stream};

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live session registry.
    pub registry: Arc<SessionRegistry>,
    /// Inbound message router over the registry.
    pub inbound: Arc<InboundRouter>,
    /// Authentication predicate gating both transport endpoints.
    pub authenticator: Arc<dyn Authenticator>,
    /// Consumer registered on each new connection.
    pub consumer: Arc<dyn MessageConsumer>,
    /// Shutdown coordinator.
    pub shutdown: Arc<ShutdownCoordinator>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// When the server started.
    pub start_time: Instant,
    /// Prometheus render handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Caller-identity view of a request's headers.
    pub(crate) fn request_context(headers: &HeaderMap) -> RequestContext {
        let authorization = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok());
        RequestContext::from_authorization_header(authorization)
    }
}

/// The strand server.
pub struct StrandServer {
    config: Arc<ServerConfig>,
    registry: Arc<SessionRegistry>,
    inbound: Arc<InboundRouter>,
    authenticator: Arc<dyn Authenticator>,
    consumer: Arc<dyn MessageConsumer>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
    metrics: Option<PrometheusHandle>,
}

impl StrandServer {
    /// Create a new server over an existing registry.
    ///
    /// The registry is taken rather than constructed so the application's
    /// consumer can hold it (for the `lookup → send` producer path) before
    /// the server exists.
    pub fn new(
        config: ServerConfig,
        registry: Arc<SessionRegistry>,
        authenticator: Arc<dyn Authenticator>,
        consumer: Arc<dyn MessageConsumer>,
    ) -> Self {
        let inbound = Arc::new(InboundRouter::new(registry.clone()));
        Self {
            config: Arc::new(config),
            registry,
            inbound,
            authenticator,
            consumer,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for the `/metrics` route.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// Get the session registry.
    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the Axum router with all routes.
    pub fn router(&self) -> Router {
        let state = AppState {
            registry: self.registry.clone(),
            inbound: self.inbound.clone(),
            authenticator: self.authenticator.clone(),
            consumer: self.consumer.clone(),
            shutdown: self.shutdown.clone(),
            config: self.config.clone(),
            start_time: self.start_time,
            metrics: self.metrics.clone(),
        };

        Router::new()
            .route(&self.config.stream_path, get(stream::stream_handler))
            .route(&self.config.message_path, post(messages::message_handler))
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    /// Serve until the shutdown coordinator fires, then drain.
    ///
    /// Cancellation closes every live handle; closing releases each
    /// stream's sink, so the long-lived SSE responses finish and the
    /// accept loop can drain cleanly.
    pub async fn serve(self, listener: tokio::net::TcpListener) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        info!(%addr, "strand server listening");

        let app = self.router();
        let registry = self.registry.clone();
        let drain_token = self.shutdown.token();
        let drain = tokio::spawn(async move {
            drain_token.cancelled().await;
            info!("shutdown requested; closing live sessions");
            registry.close_all();
        });

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(self.shutdown.token().cancelled_owned())
            .await;
        match result {
            Ok(()) => {
                let _ = drain.await;
                info!("strand server stopped");
                Ok(())
            }
            Err(err) => {
                drain.abort();
                Err(err)
            }
        }
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(health::health_check(state.start_time, state.registry.len()))
}

/// GET /metrics
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
