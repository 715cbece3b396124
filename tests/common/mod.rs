//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::future::BoxFuture;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use rpc_router::config::RouterConfig;
use rpc_router::transport::{JsonRpcRequest, RpcReply, RpcTransport, TransportError, TransportFut};

type Handler =
    dyn Fn(String, JsonRpcRequest) -> BoxFuture<'static, Result<RpcReply, TransportError>> + Send + Sync;

/// Transport driven by a closure; records every request in dispatch order.
pub struct FnTransport {
    handler: Box<Handler>,
    log: Mutex<Vec<(String, JsonRpcRequest)>>,
}

impl FnTransport {
    pub fn new<F, Fut>(f: F) -> Arc<Self>
    where
        F: Fn(String, JsonRpcRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<RpcReply, TransportError>> + Send + 'static,
    {
        Arc::new(Self {
            handler: Box::new(
                move |url: String,
                      request: JsonRpcRequest|
                      -> BoxFuture<'static, Result<RpcReply, TransportError>> {
                    Box::pin(f(url, request))
                },
            ),
            log: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<(String, JsonRpcRequest)> {
        self.log.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|(url, _)| url).collect()
    }

    pub fn count_for(&self, url: &str) -> usize {
        self.requests().iter().filter(|(u, _)| u == url).count()
    }
}

impl RpcTransport for FnTransport {
    fn send<'a>(&'a self, url: &'a str, request: &'a JsonRpcRequest) -> TransportFut<'a> {
        self.log.lock().unwrap().push((url.to_string(), request.clone()));
        (self.handler)(url.to_string(), request.clone())
    }
}

/// Router config for tests: no background probes, short backoff.
pub fn test_config(endpoints: &[&str]) -> RouterConfig {
    let mut config = RouterConfig::with_endpoints(endpoints.iter().copied());
    config.health.probe_enabled = false;
    config.retries.base_delay_ms = 10;
    config.retries.max_delay_ms = 100;
    config
}

/// Yield to other tasks until `condition` holds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..10_000 {
        if condition() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}

/// A canned HTTP response.
#[derive(Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
    pub headers: Vec<(&'static str, &'static str)>,
}

impl MockResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
            headers: Vec::new(),
        }
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            headers: Vec::new(),
        }
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.headers.push((name, value));
        self
    }
}

/// Start a programmable mock JSON-RPC backend on an ephemeral port.
///
/// `f` receives the raw request body and returns the response to send.
pub async fn start_programmable_backend<F, Fut>(f: F) -> SocketAddr
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = MockResponse> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let body = read_request_body(&mut socket).await;
                        let response = f(body).await;
                        let status_text = match response.status {
                            200 => "200 OK",
                            429 => "429 Too Many Requests",
                            500 => "500 Internal Server Error",
                            502 => "502 Bad Gateway",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };
                        let mut head = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n",
                            status_text,
                            response.body.len()
                        );
                        for (name, value) in &response.headers {
                            head.push_str(&format!("{}: {}\r\n", name, value));
                        }
                        head.push_str("\r\n");
                        let _ = socket.write_all(head.as_bytes()).await;
                        let _ = socket.write_all(response.body.as_bytes()).await;
                        let _ = socket.shutdown().await;
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    addr
}

/// Start a mock backend that always answers with the same response.
pub async fn start_mock_backend(response: MockResponse) -> SocketAddr {
    start_programmable_backend(move |_| {
        let response = response.clone();
        async move { response }
    })
    .await
}

async fn read_request_body(socket: &mut tokio::net::TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return String::new(),
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
        let content_length = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);

        let body_start = header_end + 4;
        while buf.len() < body_start + content_length {
            match socket.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
            }
        }
        let end = buf.len().min(body_start + content_length);
        return String::from_utf8_lossy(&buf[body_start..end]).into_owned();
    }
}
