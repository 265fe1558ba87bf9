//! # strand-gateway
//!
//! Strand server binary — wires the session registry, auth predicate, and
//! demo echo consumer together and starts the HTTP server.

#![deny(unsafe_code)]

mod echo;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use strand_auth::{AllowAll, Authenticator, StaticToken};
use strand_server::{ServerConfig, StrandServer, metrics};
use strand_transport::SessionRegistry;

use echo::EchoConsumer;

/// Strand streaming-session gateway.
#[derive(Parser, Debug)]
#[command(name = "strand-gateway", about = "Strand streaming-session gateway")]
struct Cli {
    /// Host to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Require this bearer token on the transport endpoints.
    /// Falls back to `STRAND_AUTH_TOKEN`; unset means allow-all.
    #[arg(long)]
    auth_token: Option<String>,

    /// Seconds between SSE keep-alive comments (0 disables).
    #[arg(long)]
    keep_alive_secs: Option<u64>,

    /// Minimum log level when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    log_level: String,
}

/// Initialize the global tracing subscriber with stderr output.
fn init_subscriber(level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // set_global_default is a no-op if already set
    let _ = subscriber.try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_subscriber(&args.log_level);

    let mut config = ServerConfig::from_env();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(secs) = args.keep_alive_secs {
        config.keep_alive_secs = secs;
    }

    let token = args
        .auth_token
        .or_else(|| std::env::var("STRAND_AUTH_TOKEN").ok());
    let authenticator: Arc<dyn Authenticator> = match token {
        Some(token) => {
            info!("bearer-token authentication enabled");
            Arc::new(StaticToken::new(token))
        }
        None => {
            info!("authentication disabled (allow-all)");
            Arc::new(AllowAll)
        }
    };

    let registry = Arc::new(SessionRegistry::new());
    let consumer = Arc::new(EchoConsumer::new(registry.clone()));

    let metrics_handle = metrics::install_recorder();
    let server = StrandServer::new(config.clone(), registry, authenticator, consumer)
        .with_metrics(metrics_handle);

    let shutdown = server.shutdown().clone();
    let _ = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            shutdown.shutdown();
        }
    });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    server.serve(listener).await.context("server error")?;
    Ok(())
}
