//! Server configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the strand server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Route serving the push stream.
    pub stream_path: String,
    /// Route accepting out-of-band messages; also the path advertised to
    /// clients in the stream's first event.
    pub message_path: String,
    /// Per-connection outbound frame buffer.
    pub channel_capacity: usize,
    /// Interval between SSE keep-alive comments in seconds; `0` disables.
    /// Keep-alives stop intermediaries from severing idle connections —
    /// they never evict sessions.
    pub keep_alive_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            stream_path: "/api/stream".into(),
            message_path: "/api/messages".into(),
            channel_capacity: 256,
            keep_alive_secs: 15,
        }
    }
}

impl ServerConfig {
    /// Defaults overlaid with `STRAND_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().overlay(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup (env vars in production; a plain
    /// closure in tests). Unparsable values keep the current setting.
    #[must_use]
    pub fn overlay<F>(mut self, get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = get("STRAND_HOST") {
            self.host = host;
        }
        if let Some(port) = get("STRAND_PORT").and_then(|v| v.parse().ok()) {
            self.port = port;
        }
        if let Some(path) = get("STRAND_STREAM_PATH") {
            self.stream_path = path;
        }
        if let Some(path) = get("STRAND_MESSAGE_PATH") {
            self.message_path = path;
        }
        if let Some(capacity) = get("STRAND_CHANNEL_CAPACITY").and_then(|v| v.parse().ok()) {
            self.channel_capacity = capacity;
        }
        if let Some(secs) = get("STRAND_KEEP_ALIVE_SECS").and_then(|v| v.parse().ok()) {
            self.keep_alive_secs = secs;
        }
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_host_and_port() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 0);
    }

    #[test]
    fn default_paths() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.stream_path, "/api/stream");
        assert_eq!(cfg.message_path, "/api/messages");
    }

    #[test]
    fn default_channel_capacity() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.channel_capacity, 256);
    }

    #[test]
    fn default_keep_alive() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.keep_alive_secs, 15);
    }

    #[test]
    fn overlay_applies_known_keys() {
        let cfg = ServerConfig::default().overlay(|key| match key {
            "STRAND_HOST" => Some("0.0.0.0".into()),
            "STRAND_PORT" => Some("8080".into()),
            "STRAND_KEEP_ALIVE_SECS" => Some("0".into()),
            _ => None,
        });
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.keep_alive_secs, 0);
        // Untouched keys keep defaults.
        assert_eq!(cfg.message_path, "/api/messages");
    }

    #[test]
    fn overlay_ignores_unparsable_values() {
        let cfg = ServerConfig::default().overlay(|key| match key {
            "STRAND_PORT" => Some("not-a-port".into()),
            "STRAND_CHANNEL_CAPACITY" => Some("-5".into()),
            _ => None,
        });
        assert_eq!(cfg.port, 0);
        assert_eq!(cfg.channel_capacity, 256);
    }

    #[test]
    fn overlay_with_no_overrides_is_default() {
        let cfg = ServerConfig::default().overlay(|_| None);
        assert_eq!(cfg.host, ServerConfig::default().host);
        assert_eq!(cfg.channel_capacity, ServerConfig::default().channel_capacity);
    }

    #[test]
    fn serde_roundtrip() {
        let cfg = ServerConfig::default();
        let json = serde_json::to_string(&cfg).unwrap();
        let back: ServerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.host, cfg.host);
        assert_eq!(back.port, cfg.port);
        assert_eq!(back.stream_path, cfg.stream_path);
        assert_eq!(back.message_path, cfg.message_path);
        assert_eq!(back.channel_capacity, cfg.channel_capacity);
        assert_eq!(back.keep_alive_secs, cfg.keep_alive_secs);
    }
}
