//! Upstream registry subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     UpstreamConfig[]
//!     → origin.rs (parse scheme/authority/base path)
//!     → transport.rs (per-upstream pool + TLS trust)
//!     → registry.rs (frozen name → Upstream map)
//!
//! Per request:
//!     Decision::RouteTo(name) → registry.resolve(name) → Upstream::send
//! ```
//!
//! # Design Decisions
//! - Registry is built once and shared behind `Arc`; no per-request mutation
//! - Unknown names are a startup error, never a per-request one
//! - One forwarding attempt per request

pub mod origin;
pub mod registry;
pub mod transport;

use std::time::Duration;
use thiserror::Error;

pub use origin::Origin;
pub use registry::{Upstream, UpstreamRegistry};

/// Startup-time registry errors.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid upstream URL `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("upstream `{0}` is registered twice")]
    Duplicate(String),
    #[error("upstream `{0}` is not registered")]
    Unknown(String),
    #[error("TLS client setup failed for upstream `{name}`: {source}")]
    Tls {
        name: String,
        #[source]
        source: rustls::Error,
    },
}

/// Per-request forwarding errors. Always mapped to a 502.
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("failed to build upstream request: {0}")]
    Build(#[from] axum::http::Error),
    #[error("upstream request failed: {0}")]
    Upstream(#[source] hyper_util::client::legacy::Error),
    #[error("upstream did not respond within {0:?}")]
    Timeout(Duration),
}
