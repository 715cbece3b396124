//! Ranked selection: the default strategy.
//!
//! Candidates are ordered by
//! `(is_healthy desc, error_rate asc, avg latency asc, priority asc)`.
//! Endpoints without a latency sample sort after sampled ones at equal error rate.

use std::cmp::Ordering;
use std::collections::HashSet;

use crate::endpoint::EndpointRecord;
use crate::load_balancer::{eligible, no_healthy, EndpointSelector, NoHealthyEndpoint};

#[derive(Debug, Default)]
pub struct RankedSelector;

impl RankedSelector {
    pub fn new() -> Self {
        Self
    }
}

/// Total order used by the ranked selector.
pub fn compare(a: &EndpointRecord, b: &EndpointRecord) -> Ordering {
    b.is_healthy
        .cmp(&a.is_healthy)
        .then_with(|| a.error_rate().total_cmp(&b.error_rate()))
        .then_with(|| {
            let latency_a = a.latency_ms().unwrap_or(f64::INFINITY);
            let latency_b = b.latency_ms().unwrap_or(f64::INFINITY);
            latency_a.total_cmp(&latency_b)
        })
        .then_with(|| a.priority.cmp(&b.priority))
}

/// Every record in rank order, best first.
pub fn rank(candidates: &[EndpointRecord]) -> Vec<EndpointRecord> {
    let mut ranked = candidates.to_vec();
    ranked.sort_by(compare);
    ranked
}

impl EndpointSelector for RankedSelector {
    fn select(
        &self,
        candidates: &[EndpointRecord],
        excluding: &HashSet<String>,
    ) -> Result<EndpointRecord, NoHealthyEndpoint> {
        eligible(candidates, excluding)
            .min_by(|a, b| compare(a, b))
            .cloned()
            .ok_or_else(|| no_healthy(candidates, excluding))
    }
}
