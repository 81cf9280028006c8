//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Build the per-request copy forwarded to an upstream
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The inbound request head is only read; the copy carries every rewrite
//! - The outbound URI is rebuilt from the upstream origin, never reused

use std::net::SocketAddr;

use axum::body::Body;
use axum::http::{header, request, HeaderMap, HeaderValue, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::http::headers::{append_forwarded_for, strip_hop_by_hop};
use crate::upstream::{ForwardError, Origin};

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates a UUID v4 request ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Read the request ID set by the request-id layer.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Working copy of an inbound request, rewritten for one upstream.
#[derive(Debug)]
pub struct ProxyRequest {
    inner: Request<Body>,
}

impl ProxyRequest {
    /// Copy method, headers and body, then point the copy at `origin`.
    pub fn new(
        inbound: &request::Parts,
        body: Body,
        origin: &Origin,
        caller: Option<SocketAddr>,
    ) -> Result<Self, ForwardError> {
        let uri = origin.target_uri(inbound.uri.path_and_query())?;

        let mut headers = inbound.headers.clone();
        strip_hop_by_hop(&mut headers);
        headers.insert(header::HOST, origin.host_header().clone());
        if let Some(addr) = caller {
            append_forwarded_for(&mut headers, addr.ip());
        }

        let mut inner = Request::builder()
            .method(inbound.method.clone())
            .uri(uri)
            .body(body)?;
        *inner.headers_mut() = headers;

        Ok(Self { inner })
    }

    pub fn uri(&self) -> &Uri {
        self.inner.uri()
    }

    pub fn headers(&self) -> &HeaderMap {
        self.inner.headers()
    }

    pub fn into_inner(self) -> Request<Body> {
        self.inner
    }
}
