//! SSL proxy
//!
//! A local HTTPS front door for exercising several backend services through
//! one address during testing.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────────┐
//!                     │                    SSL PROXY                      │
//!   Client (HTTPS)    │  ┌──────────┐   ┌────────────┐   ┌────────────┐  │
//!   ──────────────────┼─▶│ net/tls  │──▶│  routing   │──▶│  dispatch  │──┼──▶ product
//!                     │  │ listener │   │ classifier │   │  rewrite   │──┼──▶ internal-artifactory
//!                     │  └──────────┘   └─────┬──────┘   └─────┬──────┘──┼──▶ public-artifactory
//!                     │                       │                │         │
//!   ◀─────────────────┼── health / preflight ─┘     502 on failure       │
//!                     └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use ssl_proxy::config::{ProxyConfig, UpstreamTrust};
use ssl_proxy::lifecycle::{signals, startup, Shutdown};
use ssl_proxy::observability::logging;

#[derive(Parser, Debug)]
#[command(name = "ssl-proxy", version)]
#[command(about = "Local HTTPS front door that routes requests to fixed upstreams by path", long_about = None)]
struct Cli {
    /// Address to listen on.
    #[arg(long, value_name = "ADDR")]
    bind: Option<String>,

    /// PEM certificate chain presented to clients.
    #[arg(long, value_name = "PATH")]
    cert: Option<PathBuf>,

    /// PEM private key for the certificate.
    #[arg(long, value_name = "PATH")]
    key: Option<PathBuf>,

    /// Verify this upstream's certificate against the platform trust store. Repeatable.
    #[arg(long = "verify-upstream", value_name = "NAME")]
    verify_upstream: Vec<String>,

    /// Serve Prometheus metrics on this address.
    #[arg(long, value_name = "ADDR")]
    metrics_address: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<ProxyConfig, Box<dyn std::error::Error>> {
        let mut config = ProxyConfig::default();
        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(cert) = self.cert {
            config.listener.cert_path = cert;
        }
        if let Some(key) = self.key {
            config.listener.key_path = key;
        }
        for name in &self.verify_upstream {
            config.set_trust(name, UpstreamTrust::Verify)?;
        }
        config.observability.metrics_address = self.metrics_address;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    tracing::info!("ssl-proxy v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Cli::parse().into_config()?;

    let ready = match startup::prepare(config) {
        Ok(ready) => ready,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    };

    let shutdown = Shutdown::new();
    let mut server = tokio::spawn(ready.serve(shutdown.subscribe()));

    tokio::select! {
        result = &mut server => {
            result??;
            return Ok(());
        }
        _ = signals::forward_signals(&shutdown) => {}
    }

    // Wait for in-flight requests to drain.
    server.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
