//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe endpoints that are unhealthy or idle
//! - Feed probe results through the health tracker

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::config::HealthConfig;
use crate::health::tracker::HealthTracker;
use crate::transport::{JsonRpcRequest, RpcTransport};

/// Summary of one probe round.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProbeRound {
    pub probed: usize,
    pub healthy: usize,
}

pub struct HealthMonitor {
    tracker: HealthTracker,
    transport: Arc<dyn RpcTransport>,
    config: HealthConfig,
    request_ids: Arc<AtomicU64>,
}

impl HealthMonitor {
    pub fn new(
        tracker: HealthTracker,
        transport: Arc<dyn RpcTransport>,
        config: HealthConfig,
        request_ids: Arc<AtomicU64>,
    ) -> Self {
        Self {
            tracker,
            transport,
            config,
            request_ids,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if !self.config.probe_enabled {
            tracing::info!("Active health probes disabled");
            return;
        }

        tracing::info!(
            interval = self.config.probe_interval_secs,
            method = %self.config.probe_method,
            "Health monitor starting"
        );

        let mut ticker = time::interval(self.config.probe_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            // A round in progress is abandoned on shutdown.
            let round = async {
                ticker.tick().await;
                self.probe_idle().await
            };
            tokio::select! {
                _ = round => {}
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe endpoints that are unhealthy or have been idle for a full interval.
    pub async fn probe_idle(&self) -> ProbeRound {
        let targets = self
            .tracker
            .registry()
            .probe_candidates(self.config.probe_interval(), Instant::now());
        self.probe_urls(&targets).await
    }

    /// Probe every endpoint regardless of recent traffic.
    pub async fn probe_all(&self) -> ProbeRound {
        let targets: Vec<String> = self
            .tracker
            .registry()
            .snapshot()
            .into_iter()
            .map(|r| r.url)
            .collect();
        self.probe_urls(&targets).await
    }

    async fn probe_urls(&self, targets: &[String]) -> ProbeRound {
        if targets.is_empty() {
            return ProbeRound::default();
        }

        let timeout = self.config.probe_timeout();
        let checks = targets.iter().map(|url| {
            let id = self.request_ids.fetch_add(1, Ordering::Relaxed);
            let request =
                JsonRpcRequest::new(id, self.config.probe_method.clone(), Value::Array(Vec::new()));
            async move {
                self.tracker
                    .probe(self.transport.as_ref(), url, &request, timeout)
                    .await
            }
        });
        let results = join_all(checks).await;

        let round = ProbeRound {
            probed: results.len(),
            healthy: results.iter().filter(|ok| **ok).count(),
        };
        tracing::debug!(probed = round.probed, healthy = round.healthy, "Probe round complete");
        round
    }
}
