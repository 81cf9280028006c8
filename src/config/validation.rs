//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing upstreams)
//! - Validate addresses, URLs, timeouts and header values
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before any subsystem is built from the config

use axum::http::HeaderValue;
use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("bind address `{0}` is not a socket address")]
    BindAddress(String),
    #[error("upstream name must not be empty")]
    EmptyUpstreamName,
    #[error("upstream `{0}` is defined more than once")]
    DuplicateUpstream(String),
    #[error("upstream `{name}` has invalid base URL `{url}`: {reason}")]
    UpstreamUrl { name: String, url: String, reason: String },
    #[error("route `{0}` has an empty marker")]
    EmptyMarker(String),
    #[error("route `{route}` references unknown upstream `{upstream}`")]
    UnknownRouteUpstream { route: String, upstream: String },
    #[error("default upstream `{0}` is not defined")]
    UnknownDefaultUpstream(String),
    #[error("health path `{0}` must start with `/`")]
    HealthPath(String),
    #[error("CORS header value `{0}` is not a valid header value")]
    CorsHeader(String),
    #[error("metrics address `{0}` is not a socket address")]
    MetricsAddress(String),
    #[error("timeout `{0}` must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Validate the configuration, collecting every error found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if let Some(address) = &config.observability.metrics_address {
        if address.parse::<SocketAddr>().is_err() {
            errors.push(ValidationError::MetricsAddress(address.clone()));
        }
    }

    let timeouts = &config.timeouts;
    for (name, secs) in [
        ("read_secs", timeouts.read_secs),
        ("write_secs", timeouts.write_secs),
        ("idle_secs", timeouts.idle_secs),
    ] {
        if secs == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    let mut names = HashSet::new();
    for upstream in &config.upstreams {
        if upstream.name.is_empty() {
            errors.push(ValidationError::EmptyUpstreamName);
        } else if !names.insert(upstream.name.as_str()) {
            errors.push(ValidationError::DuplicateUpstream(upstream.name.clone()));
        }
        if let Err(reason) = check_base_url(&upstream.base_url) {
            errors.push(ValidationError::UpstreamUrl {
                name: upstream.name.clone(),
                url: upstream.base_url.clone(),
                reason,
            });
        }
    }

    for route in &config.routes {
        if route.marker.is_empty() {
            errors.push(ValidationError::EmptyMarker(route.name.clone()));
        }
        if !names.contains(route.upstream.as_str()) {
            errors.push(ValidationError::UnknownRouteUpstream {
                route: route.name.clone(),
                upstream: route.upstream.clone(),
            });
        }
    }

    if !names.contains(config.default_upstream.as_str()) {
        errors.push(ValidationError::UnknownDefaultUpstream(config.default_upstream.clone()));
    }

    for path in &config.health_paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::HealthPath(path.clone()));
        }
    }

    let cors = &config.cors;
    let values = [
        cors.allow_origin.clone(),
        cors.allow_methods.join(", "),
        cors.allow_headers.join(", "),
    ];
    for value in values {
        if HeaderValue::from_str(&value).is_err() {
            errors.push(ValidationError::CorsHeader(value));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_base_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme `{}`", other)),
    }
    if url.host_str().is_none() {
        return Err("missing host".to_string());
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("query and fragment are not allowed".to_string());
    }
    Ok(())
}
