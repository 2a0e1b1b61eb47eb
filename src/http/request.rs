//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate unique request IDs (UUID v4)
//! - Prepare inbound headers for forwarding to a backend
//! - Hand the inbound body to forwarding attempts without buffering it
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - Hop-by-hop headers are stripped; end-to-end headers pass through untouched
//! - The body is streamed; a failed attempt that never read it leaves it
//!   available for the next attempt

use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Request};
use hyper::body::{Body as HttpBody, Frame, SizeHint};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::load_balancer::Backend;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

const X_FORWARDED_FOR: &str = "x-forwarded-for";
const X_FORWARDED_HOST: &str = "x-forwarded-host";
const X_FORWARDED_PROTO: &str = "x-forwarded-proto";

/// Headers that describe a single connection and must not be forwarded.
const HOP_BY_HOP: [&str; 9] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "proxy-connection",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

/// Generates a UUID v4 request ID for requests that arrive without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Remove hop-by-hop headers, including any listed in `Connection`.
pub fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let listed: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
        .collect();

    for name in listed {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
}

/// Rewrite inbound headers for `backend`.
///
/// `Host` targets the backend; the original host and client address are
/// recorded in the `X-Forwarded-*` headers.
pub fn prepare_forward_headers(headers: &mut HeaderMap, backend: &Backend, client_addr: Option<SocketAddr>) {
    strip_hop_by_hop(headers);

    if let Some(original_host) = headers.get(header::HOST).cloned() {
        headers.insert(X_FORWARDED_HOST, original_host);
    }
    if let Ok(host) = HeaderValue::from_str(&backend.authority()) {
        headers.insert(header::HOST, host);
    }

    if let Some(addr) = client_addr {
        let client_ip = addr.ip().to_string();
        let forwarded_for = match headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            Some(prior) => format!("{}, {}", prior, client_ip),
            None => client_ip,
        };
        if let Ok(value) = HeaderValue::from_str(&forwarded_for) {
            headers.insert(X_FORWARDED_FOR, value);
        }
    }

    headers
        .entry(X_FORWARDED_PROTO)
        .or_insert(HeaderValue::from_static("http"));
}

/// Declared inbound body size, used for the bytes-in counter.
pub fn content_length(headers: &HeaderMap) -> u64 {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .unwrap_or(0)
}

/// The inbound body, shared by the forwarding attempts of one request.
///
/// The first attempt that polls its body takes the stream. Attempts that fail
/// before polling (connect errors, timeouts before the request was written)
/// leave it in place for the next attempt.
#[derive(Debug, Clone)]
pub struct SharedBody {
    slot: Arc<Mutex<Option<Body>>>,
    hint: SizeHint,
    empty: bool,
}

impl SharedBody {
    pub fn new(body: Body) -> Self {
        let hint = body.size_hint();
        let empty = body.is_end_stream();
        Self {
            slot: Arc::new(Mutex::new(Some(body))),
            hint,
            empty,
        }
    }

    /// A body for one forwarding attempt.
    pub fn attempt(&self) -> Body {
        Body::new(AttemptBody {
            slot: self.slot.clone(),
            inner: None,
            hint: self.hint.clone(),
            empty: self.empty,
        })
    }

    /// True once a non-empty body has been taken by an attempt and can no
    /// longer be replayed.
    pub fn is_spent(&self) -> bool {
        !self.empty && self.slot.lock().unwrap_or_else(PoisonError::into_inner).is_none()
    }
}

struct AttemptBody {
    slot: Arc<Mutex<Option<Body>>>,
    inner: Option<Body>,
    hint: SizeHint,
    empty: bool,
}

impl HttpBody for AttemptBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Bytes>, axum::Error>>> {
        let this = self.get_mut();
        if this.inner.is_none() {
            this.inner = this.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        }
        match this.inner.as_mut() {
            Some(body) => Pin::new(body).poll_frame(cx),
            None => Poll::Ready(None),
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.inner {
            Some(body) => body.is_end_stream(),
            None => self.empty,
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.inner {
            Some(body) => body.size_hint(),
            None => self.hint.clone(),
        }
    }
}
