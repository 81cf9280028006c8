//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TLS connection (axum-server)
//!     → server.rs (router, middleware, timeouts)
//!     → dispatch.rs (classify, answer locally or forward)
//!     → request.rs (request ID, rewritten upstream copy)
//!     → upstream client
//!     → response.rs (stream back, or synthesized health/preflight/502)
//!     → headers.rs (hop-by-hop removal, CORS on every response)
//! ```

pub mod dispatch;
pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use dispatch::AppState;
pub use request::{MakeRequestUuid, ProxyRequest, X_REQUEST_ID};
pub use server::HttpServer;
