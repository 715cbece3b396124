//! Endpoint registry.
//!
//! # Responsibilities
//! - Hold one record per configured endpoint, in configuration order
//! - Hand out snapshot copies to readers
//! - Expose mutation only to the health tracker
//!
//! # Design Decisions
//! - Built once; endpoints are never added or removed at runtime
//! - A single mutex guards all records; critical sections never await

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::endpoint::record::EndpointRecord;

#[derive(Debug)]
struct EndpointSlot {
    record: EndpointRecord,
    last_activity: Option<Instant>,
}

/// Ordered collection of endpoint records.
#[derive(Debug)]
pub struct EndpointRegistry {
    slots: Mutex<Vec<EndpointSlot>>,
}

impl EndpointRegistry {
    /// Build the registry from an ordered URL list. Duplicate URLs keep their first position.
    pub fn new<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut slots: Vec<EndpointSlot> = Vec::new();
        for url in urls {
            let url = url.into();
            if slots.iter().any(|s| s.record.url == url) {
                tracing::warn!(endpoint = %url, "Ignoring duplicate endpoint");
                continue;
            }
            let priority = slots.len();
            slots.push(EndpointSlot {
                record: EndpointRecord::new(url, priority),
                last_activity: None,
            });
        }
        Self {
            slots: Mutex::new(slots),
        }
    }

    /// Copies of every record, in configuration order.
    pub fn snapshot(&self) -> Vec<EndpointRecord> {
        let slots = self.slots.lock().expect("endpoint registry mutex poisoned");
        slots.iter().map(|s| s.record.clone()).collect()
    }

    /// Copy of a single record.
    pub fn get(&self, url: &str) -> Option<EndpointRecord> {
        let slots = self.slots.lock().expect("endpoint registry mutex poisoned");
        slots.iter().find(|s| s.record.url == url).map(|s| s.record.clone())
    }

    pub fn len(&self) -> usize {
        self.slots.lock().expect("endpoint registry mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of endpoints currently flagged healthy.
    pub fn healthy_count(&self) -> usize {
        let slots = self.slots.lock().expect("endpoint registry mutex poisoned");
        slots.iter().filter(|s| s.record.is_healthy).count()
    }

    /// URLs that are unhealthy or have seen no activity within `idle`.
    pub fn probe_candidates(&self, idle: Duration, now: Instant) -> Vec<String> {
        let slots = self.slots.lock().expect("endpoint registry mutex poisoned");
        slots
            .iter()
            .filter(|s| {
                !s.record.is_healthy
                    || s.last_activity
                        .map_or(true, |at| now.saturating_duration_since(at) >= idle)
            })
            .map(|s| s.record.url.clone())
            .collect()
    }

    /// Apply `f` to the record for `url`, stamping its activity time.
    pub(crate) fn update<R>(
        &self,
        url: &str,
        now: Instant,
        f: impl FnOnce(&mut EndpointRecord) -> R,
    ) -> Option<R> {
        let mut slots = self.slots.lock().expect("endpoint registry mutex poisoned");
        let slot = slots.iter_mut().find(|s| s.record.url == url)?;
        slot.last_activity = Some(now);
        Some(f(&mut slot.record))
    }
}
