//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared outbound client and application state
//! - Create the Axum router with all API handlers
//! - Wire up middleware (request ID, tracing, request deadline)
//! - Serve on a listener until shutdown is signalled

use axum::{body::Body, http::Request, Router};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::api;
use crate::config::LuminaryConfig;
use crate::environment::EnvironmentStore;
use crate::http::request::{propagate_request_id, request_id, set_request_id};
use crate::proxy::ProxyExecutor;
use crate::spec::{DocumentFetcher, SpecPipeline, SpecSlot};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<EnvironmentStore>,
    pub specs: Arc<SpecSlot>,
    pub pipeline: Arc<SpecPipeline>,
    pub proxy: ProxyExecutor,
}

impl AppState {
    /// Build state from config. Opens the environment store and creates the
    /// shared pooled client used by both spec fetching and proxying.
    pub async fn from_config(config: &LuminaryConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.proxy.shared_client_timeout_secs))
            .pool_max_idle_per_host(config.proxy.pool_max_idle_per_host)
            .build()?;

        let fetcher = DocumentFetcher::new(
            client.clone(),
            Duration::from_secs(config.spec.fetch_timeout_secs),
        );
        let store = EnvironmentStore::open(config.storage.environments_path()).await;

        Ok(Self {
            store: Arc::new(store),
            specs: Arc::new(SpecSlot::new()),
            pipeline: Arc::new(SpecPipeline::new(fetcher, config.spec.max_concurrent_fetches)),
            proxy: ProxyExecutor::new(
                client,
                Duration::from_secs(config.server.request_timeout_secs),
            ),
        })
    }
}

/// HTTP server for the Luminary API.
pub struct HttpServer {
    router: Router,
    config: LuminaryConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub async fn new(config: LuminaryConfig) -> Result<Self, reqwest::Error> {
        let state = AppState::from_config(&config).await?;
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &LuminaryConfig, state: AppState) -> Router {
        let trace = TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "request",
                request_id = %request_id(request.headers()),
                method = %request.method(),
                path = %request.uri().path(),
            )
        });

        api::router(state).layer(
            ServiceBuilder::new()
                .layer(set_request_id())
                .layer(trace)
                .layer(propagate_request_id())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout_secs,
                ))),
        )
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            data_file = %self.config.storage.environments_path().display(),
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &LuminaryConfig {
        &self.config
    }
}
