//! Path matching logic.
//!
//! # Responsibilities
//! - Match a path marker anywhere in the request path (substring)
//! - Match a fixed set of exact paths (health endpoints)
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Markers are substring tests, not segment matches
//! - No regex to guarantee O(n) matching

/// Trait for matching request paths against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the path matches this condition.
    fn matches(&self, path: &str) -> bool;
}

/// Matches when the marker occurs anywhere in the path.
#[derive(Debug, Clone)]
pub struct PathContainsMatcher {
    marker: String,
}

impl PathContainsMatcher {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl Matcher for PathContainsMatcher {
    fn matches(&self, path: &str) -> bool {
        path.contains(&self.marker)
    }
}

/// Matches when the path equals one of a fixed set of paths.
#[derive(Debug, Clone, Default)]
pub struct ExactPathMatcher {
    paths: Vec<String>,
}

impl ExactPathMatcher {
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }
}

impl Matcher for ExactPathMatcher {
    fn matches(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }
}
