//! Country Info API
//!
//! HTTP API serving national animal, capital city and currency data for a
//! fixed set of countries, plus an INR exchange-rate endpoint built on the
//! currency lookup.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server (request id, trace, timeout)
//!                         │
//!                         ▼
//!                     http::instrument ──▶ facts (static tables)
//!                         │                    ▲
//!                         │     http::exchange ┘ (via CurrencySource)
//!                         ▼
//!                     observability
//!                       ├─ metrics (Prometheus registry, /api/metrics)
//!                       ├─ logging (tracing events)
//!                       └─ push (Loki / OTLP worker, best effort)
//!
//!     lifecycle: Ctrl+C / SIGTERM → Shutdown → server + push worker stop
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use country_info_api::config::{load_config, load_from_env};
use country_info_api::lifecycle::{signals, Shutdown};
use country_info_api::observability::logging::init_tracing;
use country_info_api::observability::push::PushDispatcher;
use country_info_api::{HttpServer, Telemetry};

#[derive(Parser, Debug)]
#[command(name = "country-info-api", version, about = "Country info HTTP API")]
struct Args {
    /// Path to a TOML config file. Defaults plus environment when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => load_from_env()?,
    };

    init_tracing(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config_file = ?args.config,
        "country-info-api starting"
    );
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        environment = %config.observability.environment,
        loki_push = config.loki.is_enabled(),
        otlp_push = config.grafana.is_enabled(),
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(shutdown.clone());

    let (push, push_worker) = PushDispatcher::spawn(&config, shutdown.subscribe())?;
    let telemetry = Telemetry::new(push);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, telemetry)?;
    let result = server.run(listener, shutdown.subscribe()).await;

    // The server may also stop on its own error; make sure the worker drains.
    shutdown.trigger();
    if let Err(e) = push_worker.await {
        tracing::error!(error = %e, "Push worker panicked");
    }

    result?;
    tracing::info!("Shutdown complete");
    Ok(())
}
