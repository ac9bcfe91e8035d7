//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout)
//! - Bind server to listener and shut down gracefully
//! - Keep the metrics registry compacted while serving

use std::net::SocketAddr;
use std::time::Duration;

use axum::{body::Body, http::Request, routing::get, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::http::dependency::{CurrencySource, DependencyError};
use crate::http::request::{propagate_request_id_layer, request_id_layer, RequestIdExt};
use crate::http::{exchange, handlers, scrape, ui};
use crate::observability::{metrics, Telemetry};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub telemetry: Telemetry,
    pub currency: CurrencySource,
    /// `None` when the global recorder could not be installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: &AppConfig, telemetry: Telemetry) -> Result<Self, DependencyError> {
        Ok(Self {
            telemetry,
            currency: CurrencySource::from_config(&config.exchange)?,
            prometheus: metrics::init_metrics(),
        })
    }

    /// State without remote push.
    pub fn local(config: AppConfig) -> Result<Self, DependencyError> {
        Self::new(&config, Telemetry::local_only())
    }
}

/// HTTP server for the country info API.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    prometheus: Option<PrometheusHandle>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: AppConfig, telemetry: Telemetry) -> Result<Self, DependencyError> {
        let state = AppState::new(&config, telemetry)?;
        let prometheus = state.prometheus.clone();
        let router = build_router(&config, state);

        Ok(Self {
            router,
            config,
            prometheus,
        })
    }

    /// A clone of the fully layered router.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            currency_source = ?self.config.exchange.currency_source,
            "HTTP server starting"
        );

        if let Some(handle) = self.prometheus.clone() {
            metrics::spawn_upkeep(handle, shutdown.resubscribe());
        }

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Build the Axum router with all middleware layers.
#[allow(deprecated)]
pub fn build_router(config: &AppConfig, state: AppState) -> Router {
    let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
        tracing::info_span!(
            "request",
            method = %request.method(),
            uri = %request.uri(),
            request_id = request.headers().request_id().unwrap_or("unknown"),
        )
    });

    Router::new()
        .route("/", get(ui::index))
        .route("/health", get(|| async { "ok" }))
        .route("/api/animal/{country}", get(handlers::get_animal))
        .route("/api/capital/{country}", get(handlers::get_capital))
        .route("/api/currency/{country}", get(handlers::get_currency))
        .route("/api/exchange-rate/{country}", get(exchange::get_exchange_rate))
        .route("/api/metrics", get(scrape::get_metrics))
        .with_state(state)
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(propagate_request_id_layer())
        .layer(trace)
        .layer(request_id_layer())
}
