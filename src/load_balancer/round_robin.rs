//! Round-robin selection strategy.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::endpoint::EndpointRecord;
use crate::load_balancer::{no_healthy, EndpointSelector, NoHealthyEndpoint};

/// Round-robin selector.
/// Stores an internal counter to rotate through endpoints.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EndpointSelector for RoundRobin {
    fn select(
        &self,
        candidates: &[EndpointRecord],
        excluding: &HashSet<String>,
    ) -> Result<EndpointRecord, NoHealthyEndpoint> {
        if candidates.is_empty() {
            return Err(no_healthy(candidates, excluding));
        }

        let start_count = self.counter.fetch_add(1, Ordering::Relaxed);
        let len = candidates.len();

        for i in 0..len {
            let record = &candidates[(start_count + i) % len];
            if record.is_healthy && !excluding.contains(&record.url) {
                return Ok(record.clone());
            }
        }
        Err(no_healthy(candidates, excluding))
    }
}
