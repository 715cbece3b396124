//! Errors surfaced to callers of the RPC manager.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::transport::{FailureKind, TransportError};

/// The failure of one attempt against one endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptFailure {
    pub endpoint: String,
    pub error: TransportError,
}

impl AttemptFailure {
    pub fn kind(&self) -> FailureKind {
        self.error.kind()
    }
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.endpoint, self.error)
    }
}

/// Errors returned by [`RpcManager::call`](crate::RpcManager::call).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RpcError {
    /// The caller's deadline expired before a result was obtained.
    ///
    /// `failures` holds the attempts that had already failed when time ran out.
    #[error("call timed out after {}ms{}", .after.as_millis(), timeout_context(.failures))]
    Timeout {
        after: Duration,
        failures: Vec<AttemptFailure>,
    },

    /// The endpoint rejected the request itself; retrying elsewhere will not help.
    #[error("JSON-RPC error {code}: {message}")]
    Protocol { code: i64, message: String },

    /// No endpoint was eligible for even a first attempt.
    #[error("no healthy endpoint available")]
    NoHealthyEndpoint,

    /// The wait list is at its ceiling; the caller must shed load.
    #[error("request queue full ({capacity} calls waiting)")]
    QueueOverflow { capacity: usize },

    /// Every attempted endpoint failed.
    #[error("all {} attempted endpoints failed: {}", .failures.len(), join_failures(.failures))]
    Exhausted { failures: Vec<AttemptFailure> },
}

fn join_failures(failures: &[AttemptFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

fn timeout_context(failures: &[AttemptFailure]) -> String {
    if failures.is_empty() {
        String::new()
    } else {
        format!(" (earlier failures: {})", join_failures(failures))
    }
}

impl RpcError {
    /// A deadline expiry with no failed attempts behind it.
    pub fn timeout(after: Duration) -> Self {
        RpcError::Timeout {
            after,
            failures: Vec::new(),
        }
    }

    /// Whether a later resubmission of the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            RpcError::Timeout { .. }
            | RpcError::NoHealthyEndpoint
            | RpcError::Exhausted { .. } => true,
            RpcError::Protocol { .. } | RpcError::QueueOverflow { .. } => false,
        }
    }

    /// Per-endpoint failures carried by this error, if any.
    pub fn failures(&self) -> &[AttemptFailure] {
        match self {
            RpcError::Exhausted { failures } | RpcError::Timeout { failures, .. } => failures,
            _ => &[],
        }
    }

    /// Short label for metrics.
    pub fn label(&self) -> &'static str {
        match self {
            RpcError::Timeout { .. } => "timeout",
            RpcError::Protocol { .. } => "protocol",
            RpcError::NoHealthyEndpoint => "no_healthy_endpoint",
            RpcError::QueueOverflow { .. } => "queue_overflow",
            RpcError::Exhausted { .. } => "exhausted",
        }
    }
}
