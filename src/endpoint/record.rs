//! Endpoint statistics snapshot.

use serde::Serialize;

/// One RPC endpoint's identity and rolling statistics.
///
/// Values handed out by the registry are copies; mutating one has no effect
/// on the router.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointRecord {
    /// Endpoint URL, unique within the registry.
    pub url: String,
    /// Position in the configured list (0 = primary).
    pub priority: usize,
    /// Current health flag.
    pub is_healthy: bool,
    /// Completed requests since start, probes included.
    pub request_count: u64,
    /// Failed requests since start. Never exceeds `request_count`.
    pub error_count: u64,
    /// Failures since the last success.
    pub consecutive_failures: u32,
    /// Weighted moving average latency in milliseconds.
    pub avg_response_time_ms: f64,
    /// Whether the endpoint allows cross-origin calls; unknown until observed.
    pub cors_supported: Option<bool>,
}

impl EndpointRecord {
    pub fn new(url: impl Into<String>, priority: usize) -> Self {
        Self {
            url: url.into(),
            priority,
            is_healthy: true,
            request_count: 0,
            error_count: 0,
            consecutive_failures: 0,
            avg_response_time_ms: 0.0,
            cors_supported: None,
        }
    }

    /// `error_count / max(request_count, 1)`.
    pub fn error_rate(&self) -> f64 {
        self.error_count as f64 / self.request_count.max(1) as f64
    }

    /// Average latency, if at least one successful sample has been folded in.
    pub fn latency_ms(&self) -> Option<f64> {
        let successes = self.request_count - self.error_count;
        (successes > 0).then_some(self.avg_response_time_ms)
    }
}
