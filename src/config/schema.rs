//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the RPC router.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Ordered JSON-RPC endpoint URLs. Position is the static priority (primary first).
    pub endpoints: Vec<String>,

    /// Endpoint selection strategy.
    pub strategy: SelectionStrategy,

    /// Health tracking and probe settings.
    pub health: HealthConfig,

    /// Request queue (backpressure) settings.
    pub queue: QueueConfig,

    /// Failover retry configuration.
    pub retries: RetryConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Status surface settings.
    pub admin: AdminConfig,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            endpoints: vec!["http://localhost:8545".to_string()],
            strategy: SelectionStrategy::default(),
            health: HealthConfig::default(),
            queue: QueueConfig::default(),
            retries: RetryConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
            admin: AdminConfig::default(),
        }
    }
}

impl RouterConfig {
    /// Build a default configuration for the given endpoint list.
    pub fn with_endpoints<I, S>(endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            endpoints: endpoints.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Attempts allowed per logical call: configured value or one per endpoint.
    pub fn max_attempts(&self) -> usize {
        self.retries.max_attempts.unwrap_or(self.endpoints.len())
    }
}

/// Endpoint selection strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionStrategy {
    /// Rank by health, error rate, latency, then configuration order.
    #[default]
    Ranked,
    /// Rotate through healthy endpoints.
    RoundRobin,
}

/// Health tracking configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Enable the periodic background probe.
    pub probe_enabled: bool,

    /// Probe interval in seconds.
    pub probe_interval_secs: u64,

    /// Probe timeout in seconds.
    pub probe_timeout_secs: u64,

    /// Read-only JSON-RPC method used as the probe.
    pub probe_method: String,

    /// Number of consecutive failures before marking an endpoint unhealthy.
    pub consecutive_failure_threshold: u32,

    /// Weight of the newest latency sample in the moving average.
    pub latency_alpha: f64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            probe_enabled: true,
            probe_interval_secs: 30,
            probe_timeout_secs: 5,
            probe_method: "eth_blockNumber".to_string(),
            consecutive_failure_threshold: 3,
            latency_alpha: 0.3,
        }
    }
}

impl HealthConfig {
    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_interval_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

/// Request queue configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Maximum calls in flight at once.
    pub max_concurrent: usize,

    /// Maximum calls waiting for a dispatch slot.
    pub max_queue_depth: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 6,
            max_queue_depth: 100,
        }
    }
}

/// Retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum attempts per logical call (default: number of endpoints).
    pub max_attempts: Option<usize>,

    /// Base delay for exponential backoff between attempts in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: None,
            base_delay_ms: 50,
            max_delay_ms: 1000,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-attempt network timeout in milliseconds.
    pub attempt_ms: u64,

    /// Overall deadline for a logical call (queue wait included), if any.
    pub call_deadline_ms: Option<u64>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            attempt_ms: 10_000,
            call_deadline_ms: None,
        }
    }
}

impl TimeoutConfig {
    pub fn attempt(&self) -> Duration {
        Duration::from_millis(self.attempt_ms)
    }

    pub fn call_deadline(&self) -> Option<Duration> {
        self.call_deadline_ms.map(Duration::from_millis)
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Status surface configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Serve the read-only status endpoints.
    pub enabled: bool,

    /// Status server bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
