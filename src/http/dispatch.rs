//! Request dispatch.
//!
//! Every inbound request is classified once and then either answered locally
//! (preflight, health) or forwarded to exactly one upstream. Forwarding
//! failures never reach the caller as raw errors; they become a 502.

use std::error::Error;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::Request;
use axum::response::Response;

use crate::http::request::{request_id, ProxyRequest};
use crate::http::response;
use crate::observability::metrics;
use crate::routing::{Classifier, Decision};
use crate::upstream::{ForwardError, UpstreamRegistry};

/// Shared, read-only state handed to every request task.
#[derive(Debug, Clone)]
pub struct AppState {
    pub classifier: Arc<Classifier>,
    pub upstreams: Arc<UpstreamRegistry>,
    /// Deadline for the upstream response head.
    pub forward_timeout: Duration,
}

/// Main proxy handler.
pub async fn dispatch(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let caller = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    tracing::info!(
        request_id = %request_id(request.headers()),
        method = %request.method(),
        path = %request.uri().path(),
        caller = ?caller,
        "Received request"
    );

    let decision = state.classifier.classify(request.method(), request.uri().path());
    let method = request.method().to_string();

    let (response, label) = match decision {
        Decision::ShowPreflight => (response::preflight(), "preflight"),
        Decision::ShowHealth => (response::health(), "health"),
        Decision::RouteTo(name) => (forward(&state, name, caller, request).await, name),
    };

    metrics::record_request(&method, response.status().as_u16(), label, start_time);
    response
}

/// Forward to the named upstream, mapping any failure to a 502.
async fn forward(
    state: &AppState,
    name: &str,
    caller: Option<SocketAddr>,
    request: Request<Body>,
) -> Response {
    let (parts, body) = request.into_parts();
    let request_id = request_id(&parts.headers);

    let upstream = match state.upstreams.resolve(name) {
        Ok(upstream) => upstream,
        Err(e) => {
            // Unreachable once startup has checked the routing table.
            tracing::error!(request_id = %request_id, upstream = %name, error = %e, "Upstream lookup failed");
            return response::bad_gateway();
        }
    };

    tracing::info!(
        request_id = %request_id,
        upstream = %name,
        origin = %upstream.origin(),
        path = %parts.uri.path(),
        "Proxying request"
    );

    let result = match ProxyRequest::new(&parts, body, upstream.origin(), caller) {
        Ok(proxied) => upstream.send(proxied.into_inner(), state.forward_timeout).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(upstream_response) => {
            tracing::debug!(
                request_id = %request_id,
                upstream = %name,
                status = %upstream_response.status(),
                "Upstream responded"
            );
            response::from_upstream(upstream_response)
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                method = %parts.method,
                path = %parts.uri.path(),
                upstream = %name,
                error = %error_chain(&e),
                "Proxy error"
            );
            response::bad_gateway()
        }
    }
}

/// Render an error with its sources, e.g. `upstream request failed: client error (Connect): Connection refused`.
fn error_chain(err: &ForwardError) -> String {
    let mut rendered = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_text = cause.to_string();
        if !rendered.ends_with(&cause_text) {
            rendered.push_str(": ");
            rendered.push_str(&cause_text);
        }
        source = cause.source();
    }
    rendered
}
