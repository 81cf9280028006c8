//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! `ProxyConfig::default()` is the fixed deployment: three upstreams, the
//! path-marker rule set, and the listener on `127.0.0.1:8443`.

use serde::Serialize;
use std::path::PathBuf;

/// Upstream serving the product integration API (default route).
pub const PRODUCT: &str = "product";

/// Upstream hosting internal build artifacts.
pub const INTERNAL_ARTIFACTORY: &str = "internal-artifactory";

/// Upstream hosting publicly released integration artifacts.
pub const PUBLIC_ARTIFACTORY: &str = "public-artifactory";

/// Root configuration for the proxy.
///
/// Built from defaults plus command-line overrides. Serialized once at
/// startup so the effective settings appear in the debug log.
#[derive(Debug, Clone, Serialize)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, TLS material).
    pub listener: ListenerConfig,

    /// Inbound connection timeouts.
    pub timeouts: TimeoutConfig,

    /// Upstream origin definitions.
    pub upstreams: Vec<UpstreamConfig>,

    /// Path-marker rules, evaluated in declared order.
    pub routes: Vec<RouteConfig>,

    /// Upstream used when no rule matches.
    pub default_upstream: String,

    /// Paths answered locally with the health document.
    pub health_paths: Vec<String>,

    /// CORS headers stamped on every response.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            upstreams: vec![
                UpstreamConfig::new(PRODUCT, "https://integrations-qa.dev.cnc.duckutil.net")
                    .with_trust(UpstreamTrust::SkipVerify),
                UpstreamConfig::new(INTERNAL_ARTIFACTORY, "https://artifactory.tools.duckutil.net")
                    .with_trust(UpstreamTrust::SkipVerify),
                UpstreamConfig::new(PUBLIC_ARTIFACTORY, "https://repo.blackduck.com/")
                    .with_trust(UpstreamTrust::SkipVerify),
            ],
            routes: vec![
                RouteConfig {
                    name: "internal-artifacts".to_string(),
                    marker: "/artifactory/".to_string(),
                    upstream: INTERNAL_ARTIFACTORY.to_string(),
                },
                RouteConfig {
                    name: "public-integrations".to_string(),
                    marker: "blackduck/integration".to_string(),
                    upstream: PUBLIC_ARTIFACTORY.to_string(),
                },
            ],
            default_upstream: PRODUCT.to_string(),
            health_paths: vec!["/health".to_string(), "/".to_string()],
            cors: CorsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ProxyConfig {
    /// Look up an upstream definition by name.
    pub fn upstream(&self, name: &str) -> Option<&UpstreamConfig> {
        self.upstreams.iter().find(|u| u.name == name)
    }

    /// Mutable lookup, used to apply command-line overrides.
    pub fn upstream_mut(&mut self, name: &str) -> Option<&mut UpstreamConfig> {
        self.upstreams.iter_mut().find(|u| u.name == name)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Serialize)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:8443").
    pub bind_address: String,

    /// Path to certificate chain file (PEM).
    pub cert_path: PathBuf,

    /// Path to private key file (PEM).
    pub key_path: PathBuf,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8443".to_string(),
            cert_path: PathBuf::from("cert.pem"),
            key_path: PathBuf::from("key.pem"),
        }
    }
}

/// Timeout configuration for inbound connections.
#[derive(Debug, Clone, Serialize)]
pub struct TimeoutConfig {
    /// Time allowed to receive request headers, in seconds.
    pub read_secs: u64,

    /// Time allowed until the upstream response head is ready, in seconds.
    pub write_secs: u64,

    /// Keep-alive idle interval, in seconds.
    pub idle_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_secs: 30,
            write_secs: 60,
            idle_secs: 120,
        }
    }
}

/// How the proxy authenticates an upstream's certificate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamTrust {
    /// Verify the chain against the platform trust store.
    #[default]
    Verify,
    /// Accept any certificate the upstream presents.
    SkipVerify,
}

/// A single upstream origin and its outbound transport settings.
#[derive(Debug, Clone, Serialize)]
pub struct UpstreamConfig {
    /// Unique upstream identifier, referenced by routes.
    pub name: String,

    /// Base URL (scheme, host, optional port and base path).
    pub base_url: String,

    /// Idle pooled connections kept for this upstream.
    pub max_idle_connections: usize,

    /// Seconds before an idle pooled connection is closed.
    pub idle_timeout_secs: u64,

    /// Seconds allowed to establish the TCP connection.
    pub connect_timeout_secs: u64,

    /// Certificate trust policy for this upstream.
    pub trust: UpstreamTrust,
}

fn default_max_idle() -> usize {
    100
}

fn default_pool_idle_secs() -> u64 {
    90
}

fn default_connect_secs() -> u64 {
    30
}

impl UpstreamConfig {
    /// Create an upstream with default pool settings and verified trust.
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            max_idle_connections: default_max_idle(),
            idle_timeout_secs: default_pool_idle_secs(),
            connect_timeout_secs: default_connect_secs(),
            trust: UpstreamTrust::default(),
        }
    }

    pub fn with_trust(mut self, trust: UpstreamTrust) -> Self {
        self.trust = trust;
        self
    }
}

/// Route configuration mapping a path marker to an upstream.
#[derive(Debug, Clone, Serialize)]
pub struct RouteConfig {
    /// Route identifier for logging.
    pub name: String,

    /// Substring searched for in the request path.
    pub marker: String,

    /// Upstream name to forward to.
    pub upstream: String,
}

/// CORS response headers.
#[derive(Debug, Clone, Serialize)]
pub struct CorsConfig {
    pub allow_origin: String,
    pub allow_methods: Vec<String>,
    pub allow_headers: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origin: "*".to_string(),
            allow_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS", "HEAD"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allow_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ObservabilityConfig {
    /// Prometheus scrape endpoint; disabled when unset.
    pub metrics_address: Option<String>,
}
