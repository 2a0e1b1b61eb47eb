//! Response handling and transformation.
//!
//! # Responsibilities
//! - Stream backend responses back to the caller, counting bytes sent
//! - Strip hop-by-hop headers from backend responses
//! - Render proxy-side failures as structured JSON
//!
//! # Design Decisions
//! - Backend statuses (including 4xx and 5xx) pass through untouched
//! - Only a request that reached no backend gets a proxy-generated 503

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::{Body, Bytes};
use axum::http::{Response, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use hyper::body::{Body as HttpBody, Frame, SizeHint};
use serde_json::json;

use crate::error::ProxyError;
use crate::http::request::strip_hop_by_hop;
use crate::observability::metrics::ProxyMetrics;

/// The `503 Service Unavailable` sent when no backend produced a response.
pub fn unavailable(error: &ProxyError) -> Response<Body> {
    error_response(StatusCode::SERVICE_UNAVAILABLE, error)
}

/// `{"error": <category>, "message": <text>}` with `status`.
pub fn error_response(status: StatusCode, error: &ProxyError) -> Response<Body> {
    let body = json!({
        "error": error.category(),
        "message": error.to_string(),
    });
    (status, Json(body)).into_response()
}

/// Prepare a backend response for the caller.
///
/// Status and end-to-end headers are kept; the body streams through a
/// counter feeding `bytes_out`.
pub fn relay<B>(response: Response<B>, metrics: Arc<ProxyMetrics>) -> Response<Body>
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<axum::BoxError>,
{
    let (mut parts, body) = response.into_parts();
    strip_hop_by_hop(&mut parts.headers);
    let body = Body::new(MeteredBody {
        inner: Body::new(body),
        metrics,
    });
    Response::from_parts(parts, body)
}

struct MeteredBody {
    inner: Body,
    metrics: Arc<ProxyMetrics>,
}

impl HttpBody for MeteredBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Bytes>, axum::Error>>> {
        let this = self.get_mut();
        let poll = Pin::new(&mut this.inner).poll_frame(cx);
        if let Poll::Ready(Some(Ok(frame))) = &poll {
            if let Some(data) = frame.data_ref() {
                this.metrics.add_bytes_out(data.len() as u64);
            }
        }
        poll
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
