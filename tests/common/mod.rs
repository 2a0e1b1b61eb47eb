//! Shared utilities for integration tests.
//!
//! Mock backends are raw tokio TCP listeners on `127.0.0.1:0` speaking just
//! enough HTTP/1.1 to answer one request per connection.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use proxymity::config::{BackendConfig, Defaults, ProxyConfig};

/// A request as seen by a mock backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    /// Request line and headers, as received.
    pub head: String,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    /// Value of header `name`, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    }
}

/// A running mock backend.
#[derive(Debug, Clone)]
pub struct MockBackend {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Requests received, excluding health probes.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start a backend that answers each request with `handler(request)`.
pub async fn start_backend<F>(handler: F) -> MockBackend
where
    F: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
{
    spawn_backend(handler, Duration::ZERO).await
}

/// Start a backend that waits `delay` before answering non-probe requests.
pub async fn start_delayed_backend(delay: Duration, body: &'static str) -> MockBackend {
    spawn_backend(move |_| (200, body.to_string()), delay).await
}

async fn spawn_backend<F>(handler: F, delay: Duration) -> MockBackend
where
    F: Fn(&RecordedRequest) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let handler = Arc::new(handler);

    let counter = hits.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let handler = handler.clone();
            let counter = counter.clone();
            tokio::spawn(async move {
                let Some(request) = read_request(&mut socket).await else {
                    return;
                };
                if request.path != "/health" {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(delay).await;
                }
                let (status, body) = handler(&request);
                let reason = StatusCode::from_u16(status)
                    .ok()
                    .and_then(|s| s.canonical_reason())
                    .unwrap_or("Unknown");
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockBackend { addr, hits }
}

/// Start a backend that always answers `status` with `body`.
pub async fn start_fixed_backend(status: u16, body: &'static str) -> MockBackend {
    start_backend(move |_| (status, body.to_string())).await
}

/// Start a backend that reads requests and never answers.
pub async fn start_silent_backend() -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));

    let counter = hits.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let counter = counter.clone();
            tokio::spawn(async move {
                if read_request(&mut socket).await.is_some() {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
                tokio::time::sleep(Duration::from_secs(60)).await;
                drop(socket);
            });
        }
    });

    MockBackend { addr, hits }
}

/// A URL on which nothing is listening.
pub async fn dead_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

pub fn backend_config(name: &str, url: &str) -> BackendConfig {
    BackendConfig {
        name: name.to_string(),
        url: url.to_string(),
        health: "/health".to_string(),
        weight: 1,
        enabled: true,
    }
}

/// Defaulted config for `backends`, admin listener off.
pub fn test_config(backends: Vec<BackendConfig>) -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.admin.enabled = false;
    config.backends = backends;
    config.apply_defaults(&Defaults::default());
    config
}

async fn read_request(socket: &mut TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut request = RecordedRequest {
        method: String::new(),
        path: String::new(),
        head,
        body: buf[head_end..].to_vec(),
    };

    let mut request_line = request.head.lines().next()?.split_whitespace();
    request.method = request_line.next()?.to_string();
    request.path = request_line.next()?.to_string();

    let content_length: usize = request
        .header("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);
    while request.body.len() < content_length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        request.body.extend_from_slice(&chunk[..n]);
    }

    Some(request)
}
