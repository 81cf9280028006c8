//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Startup
//!     → listener.rs (bind, fail fast)
//!     → tls.rs (load cert/key, fixed cipher policy)
//!     → idle.rs (per-connection idle deadline, below TLS)
//!     → axum-server accepts, handshakes and hands plaintext HTTP to the router
//! ```
//!
//! # Design Decisions
//! - TLS is mandatory on the inbound side
//! - Certificate material is read once; rotation requires a restart

pub mod idle;
pub mod listener;
pub mod tls;
