//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (method, path)
//!     → classifier.rs (ordered decision)
//!     → matcher.rs (evaluate path conditions)
//!     → Return: ShowPreflight, ShowHealth or RouteTo(upstream)
//!
//! Rule Compilation (at startup):
//!     RouteConfig[] (declared order)
//!     → Compile matchers
//!     → Freeze as immutable Classifier
//! ```
//!
//! # Design Decisions
//! - Rules compiled at startup, immutable at runtime
//! - No regex in hot path (substring matching only)
//! - Deterministic: same input always yields the same decision
//! - First match wins, unmatched paths fall through to the default upstream

pub mod classifier;
pub mod matcher;

pub use classifier::{Classifier, Decision, Rule};
