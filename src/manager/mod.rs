//! RPC manager: the façade every blockchain read and write goes through.
//!
//! # Data Flow
//! ```text
//! call(method, params)
//!     → queue (admit now, wait FIFO, or reject with QueueOverflow)
//!     → selector (best healthy endpoint not yet tried)
//!     → transport under the per-attempt timeout
//!     → health tracker (latency / failure accounting)
//!     → success, or back to the selector, backing off before the next attempt
//! ```
//!
//! # Design Decisions
//! - The manager owns the registry; callers only ever see snapshots
//! - The probe loop is a task owned by the manager and stopped on shutdown or drop
//! - Only the aggregated failure reaches the caller

pub mod call;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{validate_config, ConfigError, RouterConfig};
use crate::endpoint::{EndpointRecord, EndpointRegistry};
use crate::error::RpcError;
use crate::health::{HealthMonitor, HealthTracker, ProbeRound};
use crate::lifecycle::Shutdown;
use crate::load_balancer::{selector_for, EndpointSelector};
use crate::observability::metrics;
use crate::queue::{QueueStatus, RequestQueue};
use crate::resilience::backoff::calculate_backoff;
use crate::resilience::retries::is_retryable;
use crate::resilience::timeouts::with_timeout;
use crate::transport::{JsonRpcRequest, RpcTransport};

pub use call::{CallState, PendingCall};

/// Per-call overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallOptions {
    /// Overall deadline covering queue wait and every attempt.
    pub deadline: Option<Duration>,
    /// Maximum endpoints to try.
    pub max_attempts: Option<usize>,
}

impl CallOptions {
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }
}

/// Aggregate view for status surfaces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub endpoints: Vec<EndpointRecord>,
    pub queue: QueueStatus,
    pub healthy_endpoints: usize,
    pub total_endpoints: usize,
}

/// Routes JSON-RPC calls across a pool of endpoints.
pub struct RpcManager {
    config: RouterConfig,
    registry: Arc<EndpointRegistry>,
    health: HealthTracker,
    selector: Box<dyn EndpointSelector>,
    queue: RequestQueue,
    transport: Arc<dyn RpcTransport>,
    request_ids: Arc<AtomicU64>,
    shutdown: Shutdown,
    probe_task: Mutex<Option<JoinHandle<()>>>,
}

impl RpcManager {
    /// Build a manager from a configuration and a transport.
    ///
    /// Does not start the background probe; see [`RpcManager::start_health_monitor`].
    pub fn new(config: RouterConfig, transport: Arc<dyn RpcTransport>) -> Result<Self, ConfigError> {
        validate_config(&config).map_err(ConfigError::Validation)?;

        let registry = Arc::new(EndpointRegistry::new(config.endpoints.iter().cloned()));
        let health = HealthTracker::new(registry.clone(), &config.health);
        let selector = selector_for(config.strategy);
        let queue = RequestQueue::new(&config.queue);

        tracing::info!(
            endpoints = registry.len(),
            strategy = ?config.strategy,
            max_concurrent = config.queue.max_concurrent,
            max_queue_depth = config.queue.max_queue_depth,
            "RPC manager initialized"
        );

        Ok(Self {
            config,
            registry,
            health,
            selector,
            queue,
            transport,
            request_ids: Arc::new(AtomicU64::new(1)),
            shutdown: Shutdown::new(),
            probe_task: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// A probe monitor sharing this manager's registry and transport.
    pub fn health_monitor(&self) -> HealthMonitor {
        HealthMonitor::new(
            self.health.clone(),
            self.transport.clone(),
            self.config.health.clone(),
            self.request_ids.clone(),
        )
    }

    /// Spawn the periodic probe task.
    ///
    /// No-op if probing is disabled, the task is already running, or the manager has
    /// been shut down.
    pub fn start_health_monitor(&self) {
        if !self.config.health.probe_enabled {
            tracing::info!("Active health probes disabled");
            return;
        }
        // Subscribe before checking, so a concurrent trigger is still delivered.
        let shutdown = self.shutdown.subscribe();
        if self.shutdown.is_triggered() {
            tracing::warn!("Manager is shut down, not starting health monitor");
            return;
        }
        let mut task = self.probe_task.lock().expect("probe task mutex poisoned");
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }
        let monitor = self.health_monitor();
        *task = Some(tokio::spawn(monitor.run(shutdown)));
    }

    /// Run one probe round against every endpoint now.
    pub async fn probe_now(&self) -> ProbeRound {
        self.health_monitor().probe_all().await
    }

    /// Stop the probe task and wait for it to exit.
    pub async fn shutdown(&self) {
        self.shutdown.trigger();
        let handle = self.probe_task.lock().expect("probe task mutex poisoned").take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Health monitor task ended abnormally");
            }
        }
    }

    /// Issue a JSON-RPC call with default options.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        self.call_with(method, params, CallOptions::default()).await
    }

    /// Issue a JSON-RPC call.
    pub async fn call_with(
        &self,
        method: &str,
        params: Value,
        options: CallOptions,
    ) -> Result<Value, RpcError> {
        let call_id = Uuid::new_v4();
        let started = Instant::now();
        let max_attempts = options
            .max_attempts
            .unwrap_or_else(|| self.config.max_attempts())
            .max(1);
        let deadline = options.deadline.or(self.config.timeouts.call_deadline());

        let id = self.request_ids.fetch_add(1, Ordering::Relaxed);
        let mut call = PendingCall::new(JsonRpcRequest::new(id, method, params), max_attempts);

        let span = tracing::debug_span!("rpc_call", %call_id, method);
        let run = self.run_call(&mut call).instrument(span);
        let outcome = match deadline {
            Some(limit) => tokio::time::timeout(limit, run).await.map_err(|_| limit),
            None => Ok(run.await),
        };
        let result = match outcome {
            Ok(result) => result,
            Err(limit) => {
                tracing::warn!(
                    %call_id,
                    method,
                    deadline_ms = limit.as_millis() as u64,
                    failed_attempts = call.failures().len(),
                    "Call deadline exceeded"
                );
                Err(call.timed_out(limit))
            }
        };

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.label(),
        };
        metrics::record_call(method, outcome, started.elapsed());
        result
    }

    async fn run_call(&self, call: &mut PendingCall) -> Result<Value, RpcError> {
        let _slot = self
            .queue
            .acquire()
            .await
            .map_err(|full| RpcError::QueueOverflow { capacity: full.capacity })?;

        let attempt_timeout = self.config.timeouts.attempt();

        loop {
            let candidates = self.registry.snapshot();
            let endpoint = match self.selector.select(&candidates, call.excluded()) {
                Ok(endpoint) => endpoint,
                Err(e) => {
                    tracing::warn!(attempts = call.attempts(), reason = %e, "No endpoint left to try");
                    call.exhaust();
                    return Err(call.take_error());
                }
            };

            // Back off only when there is somewhere left to fail over to.
            if let CallState::Failed { attempt, .. } = call.state() {
                let delay = calculate_backoff(
                    *attempt as u32,
                    self.config.retries.base_delay_ms,
                    self.config.retries.max_delay_ms,
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
            }

            call.dispatch(&endpoint.url);
            tracing::debug!(endpoint = %endpoint.url, attempt = call.attempts(), "Dispatching");

            let started = Instant::now();
            let result = with_timeout(attempt_timeout, self.transport.send(&endpoint.url, call.request())).await;
            let elapsed = started.elapsed();

            let error = match result {
                Ok(reply) => {
                    self.health.record_success(&endpoint.url, elapsed, reply.cors_allowed);
                    metrics::record_attempt(&endpoint.url, "success");
                    call.succeed();
                    tracing::debug!(
                        endpoint = %endpoint.url,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "Call succeeded"
                    );
                    return Ok(reply.result);
                }
                Err(error) => error,
            };

            metrics::record_attempt(&endpoint.url, error.kind().as_str());
            if is_retryable(&error) {
                self.health.record_failure(&endpoint.url, error.kind());
            } else {
                // The endpoint answered; the request itself was rejected.
                self.health.record_success(&endpoint.url, elapsed, None);
            }
            tracing::warn!(
                endpoint = %endpoint.url,
                attempt = call.attempts(),
                error = %error,
                "Attempt failed"
            );

            if call.fail(error).is_terminal() {
                let error = call.take_error();
                tracing::warn!(error = %error, "Call failed");
                return Err(error);
            }
        }
    }

    /// Snapshot of every endpoint, in configuration order. No I/O.
    pub fn endpoint_stats(&self) -> Vec<EndpointRecord> {
        self.registry.snapshot()
    }

    /// Queue depth and processing state. No I/O.
    pub fn queue_status(&self) -> QueueStatus {
        self.queue.status()
    }

    /// Endpoint stats and queue state together.
    pub fn status(&self) -> StatusReport {
        let endpoints = self.endpoint_stats();
        StatusReport {
            healthy_endpoints: self.registry.healthy_count(),
            total_endpoints: endpoints.len(),
            queue: self.queue_status(),
            endpoints,
        }
    }
}

impl Drop for RpcManager {
    fn drop(&mut self) {
        self.shutdown.trigger();
        if let Ok(mut task) = self.probe_task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }
}

impl std::fmt::Debug for RpcManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcManager")
            .field("endpoints", &self.config.endpoints)
            .field("strategy", &self.config.strategy)
            .field("queue", &self.queue.status())
            .finish()
    }
}
