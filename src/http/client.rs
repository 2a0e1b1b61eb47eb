//! Upstream HTTP client construction.

use std::time::Duration;

use axum::body::Body;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

/// Client used for both proxied requests and health probes.
pub type UpstreamClient = Client<HttpConnector, Body>;

/// Build an HTTP/1.1 client with the given connect timeout.
pub fn build_client(connect_timeout: Duration) -> UpstreamClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(connect_timeout));
    connector.set_nodelay(true);

    Client::builder(TokioExecutor::new()).build(connector)
}
