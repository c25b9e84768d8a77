//! kube-hello entry point.
//!
//! Initializes tracing, resolves configuration from the optional TOML file and
//! the environment, builds the request metrics and readiness gate, and serves
//! the router until a shutdown signal arrives.

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use kube_hello::config::{AppConfig, DEFAULT_LOG_FILTER, ENV_HELP};
use kube_hello::http::start_server;
use kube_hello::{create_router, AppState, RequestMetrics};

/// kube-hello: greeting service with liveness, readiness and metrics probes
#[derive(Parser, Debug)]
#[command(name = "kube-hello", version, about, after_help = ENV_HELP)]
struct Args {
    /// Path to an optional TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Log level filter (e.g., "kube_hello=debug,tower_http=info")
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Configuration errors are fatal; a bad READY_DELAY_SECONDS never falls back to the default
    let config = AppConfig::load(args.config.as_deref())?;

    // Initialize tracing with priority: CLI > env > default
    let log_filter = args
        .log_level
        .or_else(|| std::env::var("RUST_LOG").ok())
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());

    let registry =
        tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::new(&log_filter));
    if config.logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(
        host = %config.http.host,
        port = config.http.port,
        ready_delay_secs = config.app.ready_delay_seconds,
        message = %config.app.message,
        "Loaded configuration"
    );

    let metrics = RequestMetrics::new()?;

    // Process start time is captured here, before the listener is bound
    let state = AppState::new(&config, metrics);
    let app = create_router(state);

    start_server(app, &config).await?;

    Ok(())
}
