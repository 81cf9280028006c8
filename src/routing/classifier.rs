//! Request classification.
//!
//! # Responsibilities
//! - Short-circuit CORS preflight and health requests
//! - Map every other request to exactly one upstream name
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Fixed evaluation order: preflight, health, rules in declared order, default
//! - First match wins, so overlapping markers resolve deterministically

use axum::http::Method;

use crate::config::ProxyConfig;
use crate::routing::matcher::{ExactPathMatcher, Matcher, PathContainsMatcher};

/// Outcome of classifying a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision<'a> {
    /// Answer the CORS preflight locally.
    ShowPreflight,
    /// Answer with the health document locally.
    ShowHealth,
    /// Forward to the named upstream.
    RouteTo(&'a str),
}

/// A compiled routing rule.
#[derive(Debug)]
pub struct Rule {
    pub name: String,
    pub upstream: String,
    matcher: Box<dyn Matcher>,
}

impl Rule {
    pub fn new(name: impl Into<String>, matcher: Box<dyn Matcher>, upstream: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            upstream: upstream.into(),
            matcher,
        }
    }
}

/// Pure function from (method, path) to a [`Decision`].
#[derive(Debug)]
pub struct Classifier {
    health: ExactPathMatcher,
    rules: Vec<Rule>,
    default_upstream: String,
}

impl Classifier {
    pub fn new(health: ExactPathMatcher, rules: Vec<Rule>, default_upstream: impl Into<String>) -> Self {
        Self {
            health,
            rules,
            default_upstream: default_upstream.into(),
        }
    }

    /// Compile the classifier from configuration, keeping rule order.
    pub fn from_config(config: &ProxyConfig) -> Self {
        let rules = config
            .routes
            .iter()
            .map(|route| {
                Rule::new(
                    route.name.clone(),
                    Box::new(PathContainsMatcher::new(route.marker.clone())),
                    route.upstream.clone(),
                )
            })
            .collect();

        Self::new(
            ExactPathMatcher::new(config.health_paths.iter().cloned()),
            rules,
            config.default_upstream.clone(),
        )
    }

    pub fn classify(&self, method: &Method, path: &str) -> Decision<'_> {
        if *method == Method::OPTIONS {
            return Decision::ShowPreflight;
        }
        if self.health.matches(path) {
            return Decision::ShowHealth;
        }
        let upstream = self
            .rules
            .iter()
            .find(|rule| rule.matcher.matches(path))
            .map(|rule| rule.upstream.as_str())
            .unwrap_or(self.default_upstream.as_str());
        Decision::RouteTo(upstream)
    }

    /// Every upstream name this classifier can route to.
    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.rules
            .iter()
            .map(|rule| rule.upstream.as_str())
            .chain(std::iter::once(self.default_upstream.as_str()))
    }
}
