//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! ProxyConfig::default() (fixed deployment)
//!     → command-line overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → consumed once at startup to build the registry and classifier
//! ```
//!
//! # Design Decisions
//! - No config file: defaults describe the deployment
//! - Config is immutable once validated
//! - Validation separates syntactic (serde) from semantic checks

pub mod schema;
pub mod validation;

use thiserror::Error;

pub use schema::{
    CorsConfig, ListenerConfig, ObservabilityConfig, ProxyConfig, RouteConfig, TimeoutConfig,
    UpstreamConfig, UpstreamTrust, INTERNAL_ARTIFACTORY, PRODUCT, PUBLIC_ARTIFACTORY,
};
pub use validation::{validate_config, ValidationError};

/// Error type for configuration checks.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
    #[error("unknown upstream `{0}`")]
    UnknownUpstream(String),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl ProxyConfig {
    /// Validate and hand back the config, ready for startup.
    pub fn validated(self) -> Result<Self, ConfigError> {
        validate_config(&self).map_err(ConfigError::Validation)?;
        Ok(self)
    }

    /// Switch one upstream's trust policy by name.
    pub fn set_trust(&mut self, name: &str, trust: UpstreamTrust) -> Result<(), ConfigError> {
        let upstream = self
            .upstream_mut(name)
            .ok_or_else(|| ConfigError::UnknownUpstream(name.to_string()))?;
        upstream.trust = trust;
        Ok(())
    }
}
