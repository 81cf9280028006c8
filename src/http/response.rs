//! Response handling and transformation.
//!
//! # Responsibilities
//! - Synthesize the health, preflight and upstream-failure responses
//! - Hand upstream responses back to the caller as a stream
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - Hop-by-hop headers stripped from upstream responses
//! - Every forwarding failure maps to the same 502 document

use axum::body::Body;
use axum::http::{Response as HttpResponse, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use hyper::body::Incoming;
use serde::Serialize;

use crate::http::headers::strip_hop_by_hop;

/// Body of the local health response.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub message: &'static str,
}

pub const HEALTHY: HealthStatus = HealthStatus {
    status: "ok",
    message: "SSL proxy is running",
};

/// Body of the 502 returned when forwarding fails.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: &'static str,
}

pub const UPSTREAM_UNAVAILABLE: ErrorBody = ErrorBody {
    error: "upstream server unavailable",
    message: "This is expected in testing environment",
};

pub fn health() -> Response {
    (StatusCode::OK, Json(HEALTHY)).into_response()
}

/// Empty 200; the CORS layers supply the headers.
pub fn preflight() -> Response {
    StatusCode::OK.into_response()
}

pub fn bad_gateway() -> Response {
    (StatusCode::BAD_GATEWAY, Json(UPSTREAM_UNAVAILABLE)).into_response()
}

/// Stream an upstream response back without its hop-by-hop headers.
pub fn from_upstream(response: HttpResponse<Incoming>) -> Response {
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    Response::from_parts(parts, Body::new(body))
}
