//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration and build the registry/classifier
//! - Load TLS material
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listener binds last (traffic only when ready)

use std::net::{SocketAddr, TcpListener};

use axum::http::header::InvalidHeaderValue;
use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::{ConfigError, ProxyConfig, ValidationError};
use crate::http::HttpServer;
use crate::net::listener::{self, ListenerError};
use crate::net::tls::{self, TlsError};
use crate::observability::metrics;
use crate::upstream::RegistryError;

/// Everything that can stop the proxy from serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("invalid CORS header: {0}")]
    Cors(#[from] InvalidHeaderValue),
    #[error("TLS setup failed: {0}")]
    Tls(#[from] TlsError),
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error("server failed: {0}")]
    Serve(#[from] std::io::Error),
}

/// A proxy that has passed every startup check and holds its bound socket.
pub struct ReadyServer {
    server: HttpServer,
    listener: TcpListener,
    tls: RustlsConfig,
}

impl ReadyServer {
    pub fn local_addr(&self) -> Result<SocketAddr, StartupError> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve until the shutdown signal fires.
    pub async fn serve(self, shutdown: broadcast::Receiver<()>) -> Result<(), StartupError> {
        self.server.run(self.listener, self.tls, shutdown).await?;
        Ok(())
    }
}

/// Run every startup step in order.
pub fn prepare(config: ProxyConfig) -> Result<ReadyServer, StartupError> {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstreams = config.upstreams.len(),
        routes = config.routes.len(),
        "Configuration loaded"
    );
    tracing::debug!(
        config = %serde_json::to_string(&config).unwrap_or_default(),
        "Effective configuration"
    );

    let server = HttpServer::new(config)?;
    let config = server.config();

    let tls = tls::load_tls_config(&config.listener.cert_path, &config.listener.key_path)?;

    if let Some(address) = &config.observability.metrics_address {
        let addr = address.parse::<SocketAddr>().map_err(|_| {
            ConfigError::Validation(vec![ValidationError::MetricsAddress(address.clone())])
        })?;
        metrics::init_metrics(addr);
    }

    let listener = listener::bind(&config.listener)?;

    Ok(ReadyServer {
        server,
        listener,
        tls,
    })
}
