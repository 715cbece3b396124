//! Endpoint selection subsystem.
//!
//! # Data Flow
//! ```text
//! Logical call needs an endpoint
//!     → registry snapshot + URLs already tried for this call
//!     → Apply selection algorithm:
//!         - ranked.rs (health, error rate, latency, configuration order)
//!         - round_robin.rs (rotate through healthy endpoints)
//!     → EndpointRecord or NoHealthyEndpoint
//! ```
//!
//! # Design Decisions
//! - Selectors are pure functions of the snapshot (round robin keeps only a counter)
//! - Unhealthy and already-tried endpoints are never selected
//! - Ties break on configuration order so selection is deterministic

pub mod ranked;
pub mod round_robin;

use std::collections::HashSet;
use std::fmt::Debug;

use thiserror::Error;

use crate::config::SelectionStrategy;
use crate::endpoint::EndpointRecord;

pub use ranked::RankedSelector;
pub use round_robin::RoundRobin;

/// Every endpoint is either excluded or unhealthy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no healthy endpoint among {total} ({excluded} already tried)")]
pub struct NoHealthyEndpoint {
    pub total: usize,
    pub excluded: usize,
}

/// Picks the endpoint for the next attempt.
pub trait EndpointSelector: Send + Sync + Debug {
    fn select(
        &self,
        candidates: &[EndpointRecord],
        excluding: &HashSet<String>,
    ) -> Result<EndpointRecord, NoHealthyEndpoint>;
}

/// Build the selector for a configured strategy.
pub fn selector_for(strategy: SelectionStrategy) -> Box<dyn EndpointSelector> {
    match strategy {
        SelectionStrategy::Ranked => Box::new(RankedSelector::new()),
        SelectionStrategy::RoundRobin => Box::new(RoundRobin::new()),
    }
}

/// Endpoints eligible for selection: healthy and not yet tried.
pub(crate) fn eligible<'a>(
    candidates: &'a [EndpointRecord],
    excluding: &'a HashSet<String>,
) -> impl Iterator<Item = &'a EndpointRecord> + 'a {
    candidates
        .iter()
        .filter(move |r| r.is_healthy && !excluding.contains(&r.url))
}

pub(crate) fn no_healthy(candidates: &[EndpointRecord], excluding: &HashSet<String>) -> NoHealthyEndpoint {
    NoHealthyEndpoint {
        total: candidates.len(),
        excluded: candidates.iter().filter(|r| excluding.contains(&r.url)).count(),
    }
}
