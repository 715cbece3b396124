//! JSON-RPC transport subsystem.
//!
//! # Data Flow
//! ```text
//! RpcManager attempt
//!     → RpcTransport::send(endpoint url, JsonRpcRequest)
//!     → http.rs (POST over reqwest)
//!     → jsonrpc.rs (validate the {result} / {error} envelope)
//!     → RpcReply or TransportError
//! ```
//!
//! # Design Decisions
//! - The transport is a trait object so tests and alternative stacks can plug in
//! - Timeouts are applied by the caller, not the transport
//! - Every envelope mismatch is a protocol error, never a panic

pub mod http;
pub mod jsonrpc;

use std::time::Duration;

use futures_util::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

pub use http::HttpTransport;
pub use jsonrpc::{JsonRpcErrorObject, JsonRpcRequest, JsonRpcResponse};

/// Future returned by [`RpcTransport::send`].
pub type TransportFut<'a> = BoxFuture<'a, Result<RpcReply, TransportError>>;

/// A successful JSON-RPC reply.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcReply {
    /// The `result` member of the response.
    pub result: Value,
    /// Whether the endpoint advertised cross-origin access, when observable.
    pub cors_allowed: Option<bool>,
}

impl RpcReply {
    pub fn new(result: Value) -> Self {
        Self {
            result,
            cors_allowed: None,
        }
    }
}

/// Sends one JSON-RPC request to one endpoint.
pub trait RpcTransport: Send + Sync {
    fn send<'a>(&'a self, url: &'a str, request: &'a JsonRpcRequest) -> TransportFut<'a>;
}

/// Failure of a single attempt against a single endpoint.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransportError {
    /// The attempt exceeded its deadline.
    #[error("timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// Connection-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The endpoint answered with a non-2xx HTTP status.
    #[error("HTTP status {0}")]
    HttpStatus(u16),

    /// The endpoint returned a JSON-RPC error object.
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The body did not match the JSON-RPC 2.0 envelope.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Coarse failure classes used for health accounting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Network,
    Protocol,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::Network => "network",
            FailureKind::Protocol => "protocol",
        }
    }
}

impl TransportError {
    pub fn kind(&self) -> FailureKind {
        match self {
            TransportError::Timeout(_) => FailureKind::Timeout,
            TransportError::Network(_) | TransportError::HttpStatus(_) => FailureKind::Network,
            TransportError::Rpc { .. } | TransportError::Malformed(_) => FailureKind::Protocol,
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            // reqwest does not expose the configured duration here
            TransportError::Timeout(Duration::ZERO)
        } else if let Some(status) = e.status() {
            TransportError::HttpStatus(status.as_u16())
        } else {
            TransportError::Network(e.to_string())
        }
    }
}
