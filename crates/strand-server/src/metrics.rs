//! Prometheus metrics recorder and metric-name constants.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::info;

/// Install the Prometheus metrics recorder (global).
///
/// Returns the `PrometheusHandle` used to render the `/metrics` endpoint.
/// Must be called once at server startup before any metrics are recorded.
pub fn install_recorder() -> PrometheusHandle {
    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install metrics recorder");
    info!("prometheus metrics recorder installed");
    handle
}

// Metric name constants to avoid typos across modules.

/// Push streams opened total (counter).
pub const STREAM_CONNECTIONS_TOTAL: &str = "stream_connections_total";
/// Push streams closed total (counter).
pub const STREAM_DISCONNECTIONS_TOTAL: &str = "stream_disconnections_total";
/// Live push streams (gauge).
pub const STREAMS_ACTIVE: &str = "streams_active";
/// Stream lifetime in seconds (histogram).
pub const STREAM_DURATION_SECONDS: &str = "stream_duration_seconds";
/// Inbound messages total (counter, labels: outcome).
pub const INBOUND_MESSAGES_TOTAL: &str = "inbound_messages_total";
/// Frames written to streams total (counter).
pub const FRAMES_SENT_TOTAL: &str = "frames_sent_total";

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
