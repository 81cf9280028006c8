//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the registry and classifier from validated config
//! - Create Axum Router with the dispatch handler
//! - Wire up middleware (tracing, request ID, CORS headers)
//! - Serve over TLS with the configured timeouts
//! - Drain in-flight requests on shutdown

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::{RustlsAcceptor, RustlsConfig};
use axum_server::Handle;
use hyper_util::rt::TokioTimer;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::{ProxyConfig, TimeoutConfig};
use crate::http::dispatch::{dispatch, AppState};
use crate::http::headers::CorsHeaders;
use crate::http::request::MakeRequestUuid;
use crate::lifecycle::StartupError;
use crate::net::idle::IdleTimeoutAcceptor;
use crate::routing::Classifier;
use crate::upstream::UpstreamRegistry;

/// Time allowed for in-flight requests after shutdown is triggered.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    ///
    /// Fails if the config is invalid or any routed upstream is unregistered.
    pub fn new(config: ProxyConfig) -> Result<Self, StartupError> {
        let config = config.validated()?;

        let upstreams = UpstreamRegistry::from_config(&config)?;
        let classifier = Classifier::from_config(&config);
        upstreams.ensure_all(classifier.targets())?;

        let state = AppState {
            classifier: Arc::new(classifier),
            upstreams: Arc::new(upstreams),
            forward_timeout: Duration::from_secs(config.timeouts.write_secs),
        };

        let router = Self::build_router(&config, state)?;
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ProxyConfig, state: AppState) -> Result<Router, StartupError> {
        let cors = CorsHeaders::from_config(&config.cors)?;

        Ok(Router::new()
            // Every target form, including `*`, reaches the classifier.
            .fallback(dispatch)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(cors.allow_origin)
                    .layer(cors.allow_methods)
                    .layer(cors.allow_headers),
            ))
    }

    /// The fully layered router, for serving or in-process calls.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Serve TLS on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        tls: RustlsConfig,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTPS server starting");

        let handle = Handle::new();
        let drain = handle.clone();
        tokio::spawn(async move {
            let _ = shutdown.recv().await;
            tracing::info!("Shutdown signal received, draining connections");
            drain.graceful_shutdown(Some(DRAIN_TIMEOUT));
        });

        let idle = IdleTimeoutAcceptor::new(Duration::from_secs(self.config.timeouts.idle_secs));
        let mut server = axum_server::from_tcp(listener)
            .acceptor(RustlsAcceptor::new(tls).acceptor(idle))
            .handle(handle);
        apply_timeouts(&mut server, &self.config.timeouts);

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        server.serve(app).await?;

        tracing::info!("HTTPS server stopped");
        Ok(())
    }
}

/// Header read deadline for HTTP/1. The idle deadline lives in the acceptor.
fn apply_timeouts<A>(server: &mut axum_server::Server<A>, timeouts: &TimeoutConfig) {
    server
        .http_builder()
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(Duration::from_secs(timeouts.read_secs));
}
