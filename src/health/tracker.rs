//! Passive health tracking.
//!
//! # Responsibilities
//! - Fold call outcomes into endpoint records
//! - Track consecutive failures and flip health at the threshold
//! - Run single probes on behalf of the active monitor
//!
//! # Design Decisions
//! - Every record mutation goes through this type
//! - One success restores health and clears the failure streak
//! - Latency is an exponentially weighted moving average; the first sample seeds it

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::HealthConfig;
use crate::endpoint::EndpointRegistry;
use crate::observability::metrics;
use crate::resilience::timeouts::with_timeout;
use crate::transport::{FailureKind, JsonRpcRequest, RpcTransport};

/// Translates call outcomes into endpoint health state.
#[derive(Debug, Clone)]
pub struct HealthTracker {
    registry: Arc<EndpointRegistry>,
    alpha: f64,
    failure_threshold: u32,
}

impl HealthTracker {
    pub fn new(registry: Arc<EndpointRegistry>, config: &HealthConfig) -> Self {
        Self {
            registry,
            alpha: config.latency_alpha,
            failure_threshold: config.consecutive_failure_threshold.max(1),
        }
    }

    pub fn registry(&self) -> &Arc<EndpointRegistry> {
        &self.registry
    }

    /// Record a completed call.
    pub fn record_success(&self, url: &str, elapsed: Duration, cors_allowed: Option<bool>) {
        let sample_ms = elapsed.as_secs_f64() * 1000.0;
        let alpha = self.alpha;
        let recovered = self.registry.update(url, Instant::now(), |record| {
            let first_sample = record.latency_ms().is_none();
            record.request_count += 1;
            record.avg_response_time_ms = if first_sample {
                sample_ms
            } else {
                alpha * sample_ms + (1.0 - alpha) * record.avg_response_time_ms
            };
            record.consecutive_failures = 0;
            if record.cors_supported.is_none() {
                record.cors_supported = cors_allowed;
            }
            let recovered = !record.is_healthy;
            record.is_healthy = true;
            recovered
        });

        match recovered {
            Some(true) => {
                tracing::info!(endpoint = %url, "Endpoint recovered");
                metrics::record_endpoint_health(url, true);
            }
            Some(false) => {}
            None => tracing::warn!(endpoint = %url, "Success recorded for unknown endpoint"),
        }
    }

    /// Record a failed call.
    pub fn record_failure(&self, url: &str, kind: FailureKind) {
        let threshold = self.failure_threshold;
        let tripped = self.registry.update(url, Instant::now(), |record| {
            record.request_count += 1;
            record.error_count += 1;
            record.consecutive_failures = record.consecutive_failures.saturating_add(1);
            let tripped = record.is_healthy && record.consecutive_failures >= threshold;
            if tripped {
                record.is_healthy = false;
            }
            (tripped, record.consecutive_failures)
        });

        match tripped {
            Some((true, failures)) => {
                tracing::warn!(
                    endpoint = %url,
                    kind = kind.as_str(),
                    consecutive_failures = failures,
                    "Endpoint marked unhealthy"
                );
                metrics::record_endpoint_health(url, false);
            }
            Some((false, failures)) => {
                tracing::debug!(
                    endpoint = %url,
                    kind = kind.as_str(),
                    consecutive_failures = failures,
                    "Endpoint failure recorded"
                );
            }
            None => tracing::warn!(endpoint = %url, "Failure recorded for unknown endpoint"),
        }
    }

    /// Send one probe request to `url` and record the outcome. Returns whether it succeeded.
    pub async fn probe(
        &self,
        transport: &dyn RpcTransport,
        url: &str,
        request: &JsonRpcRequest,
        timeout: Duration,
    ) -> bool {
        let started = Instant::now();
        match with_timeout(timeout, transport.send(url, request)).await {
            Ok(reply) => {
                self.record_success(url, started.elapsed(), reply.cors_allowed);
                true
            }
            Err(e) => {
                tracing::debug!(endpoint = %url, error = %e, "Probe failed");
                self.record_failure(url, e.kind());
                false
            }
        }
    }
}
