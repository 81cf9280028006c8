//! Upstream registry.
//!
//! # Responsibilities
//! - Hold every upstream, keyed by name, for the lifetime of the process
//! - Resolve names chosen by the classifier
//! - Refuse to start when a route points at an unregistered name
//! - Send a single forwarding attempt through an upstream's own client

use std::collections::HashMap;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, Response};
use hyper::body::Incoming;

use crate::config::{ProxyConfig, UpstreamConfig, UpstreamTrust};
use crate::upstream::origin::Origin;
use crate::upstream::transport::{build_client, UpstreamClient};
use crate::upstream::{ForwardError, RegistryError};

/// A single upstream origin with its dedicated transport.
#[derive(Debug)]
pub struct Upstream {
    name: String,
    origin: Origin,
    trust: UpstreamTrust,
    client: UpstreamClient,
}

impl Upstream {
    /// Build an upstream and its client from configuration.
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, RegistryError> {
        let origin = Origin::parse(&config.base_url)?;
        let client = build_client(config)?;

        tracing::info!(
            upstream = %config.name,
            origin = %origin,
            trust = ?config.trust,
            max_idle = config.max_idle_connections,
            idle_timeout_secs = config.idle_timeout_secs,
            "Upstream registered"
        );

        Ok(Self {
            name: config.name.clone(),
            origin,
            trust: config.trust,
            client,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn trust(&self) -> UpstreamTrust {
        self.trust
    }

    /// Forward a request exactly once. No retries.
    ///
    /// `deadline` bounds the wait for the response head; the body is streamed
    /// afterwards without a deadline.
    pub async fn send(
        &self,
        request: Request<Body>,
        deadline: Duration,
    ) -> Result<Response<Incoming>, ForwardError> {
        match tokio::time::timeout(deadline, self.client.request(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(ForwardError::Upstream(e)),
            Err(_) => Err(ForwardError::Timeout(deadline)),
        }
    }
}

/// Immutable name → upstream map, shared read-only by all requests.
#[derive(Debug, Default)]
pub struct UpstreamRegistry {
    upstreams: HashMap<String, Upstream>,
}

impl UpstreamRegistry {
    /// Register every configured upstream.
    pub fn from_config(config: &ProxyConfig) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for upstream in &config.upstreams {
            registry.register(Upstream::from_config(upstream)?)?;
        }
        Ok(registry)
    }

    /// Add an upstream. Names must be unique.
    pub fn register(&mut self, upstream: Upstream) -> Result<(), RegistryError> {
        if self.upstreams.contains_key(upstream.name()) {
            return Err(RegistryError::Duplicate(upstream.name().to_string()));
        }
        self.upstreams.insert(upstream.name().to_string(), upstream);
        Ok(())
    }

    pub fn resolve(&self, name: &str) -> Result<&Upstream, RegistryError> {
        self.upstreams
            .get(name)
            .ok_or_else(|| RegistryError::Unknown(name.to_string()))
    }

    /// Check that every referenced name resolves. Called once at startup.
    pub fn ensure_all<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> Result<(), RegistryError> {
        for name in names {
            self.resolve(name)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.upstreams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upstreams.is_empty()
    }
}
