//! Request queue (backpressure) subsystem.
//!
//! # Responsibilities
//! - Bound the number of calls in flight
//! - Admit waiting calls in FIFO order as slots free up
//! - Reject submissions once the wait list is at its ceiling
//! - Report queue depth and processing state without I/O
//!
//! # Design Decisions
//! - Slots come from a fair `tokio::sync::Semaphore`, which hands permits out in
//!   request order
//! - A slot is held by a RAII permit; dropping it (completion, failure or
//!   cancellation) admits the next waiter
//! - Dropping a call that is still waiting removes it from the wait list

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::QueueConfig;
use crate::observability::metrics;

/// Point-in-time view of the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueueStatus {
    /// Calls waiting for a dispatch slot (in-flight calls excluded).
    pub size: usize,
    /// True iff at least one call is in flight.
    pub processing: bool,
    /// Calls currently holding a dispatch slot.
    pub in_flight: usize,
}

/// The wait list is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("request queue full ({capacity} calls waiting)")]
pub struct QueueFull {
    pub capacity: usize,
}

#[derive(Debug)]
struct QueueInner {
    slots: Arc<Semaphore>,
    max_queue_depth: usize,
    waiting: AtomicUsize,
    in_flight: AtomicUsize,
}

impl QueueInner {
    fn status(&self) -> QueueStatus {
        let in_flight = self.in_flight.load(Ordering::SeqCst);
        QueueStatus {
            size: self.waiting.load(Ordering::SeqCst),
            processing: in_flight > 0,
            in_flight,
        }
    }
}

/// Bounded, FIFO admission queue.
#[derive(Debug, Clone)]
pub struct RequestQueue {
    inner: Arc<QueueInner>,
}

impl RequestQueue {
    pub fn new(config: &QueueConfig) -> Self {
        let max_concurrent = config.max_concurrent.max(1);
        Self {
            inner: Arc::new(QueueInner {
                slots: Arc::new(Semaphore::new(max_concurrent)),
                max_queue_depth: config.max_queue_depth,
                waiting: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    /// Current depth and processing state. Never blocks.
    pub fn status(&self) -> QueueStatus {
        self.inner.status()
    }

    /// Wait for a dispatch slot.
    ///
    /// Returns immediately when a slot is free and nobody is waiting, fails fast with
    /// [`QueueFull`] when the wait list is at its ceiling, and otherwise waits its turn.
    pub async fn acquire(&self) -> Result<QueuePermit, QueueFull> {
        if let Ok(permit) = self.inner.slots.clone().try_acquire_owned() {
            return Ok(self.admit(permit));
        }

        self.reserve_wait_slot()?;
        let _waiting = WaitingGuard { inner: &self.inner };
        metrics::record_queue(self.inner.status());

        match self.inner.slots.clone().acquire_owned().await {
            Ok(permit) => Ok(self.admit(permit)),
            // The semaphore is never closed.
            Err(_) => Err(QueueFull {
                capacity: self.inner.max_queue_depth,
            }),
        }
    }

    fn reserve_wait_slot(&self) -> Result<(), QueueFull> {
        let capacity = self.inner.max_queue_depth;
        let mut current = self.inner.waiting.load(Ordering::SeqCst);
        loop {
            if current >= capacity {
                tracing::warn!(capacity, "Request queue full, rejecting call");
                metrics::record_queue_overflow();
                return Err(QueueFull { capacity });
            }
            match self.inner.waiting.compare_exchange_weak(
                current,
                current + 1,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Ok(()),
                Err(actual) => current = actual,
            }
        }
    }

    fn admit(&self, permit: OwnedSemaphorePermit) -> QueuePermit {
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        metrics::record_queue(self.inner.status());
        QueuePermit {
            inner: self.inner.clone(),
            _slot: permit,
        }
    }
}

/// Keeps the wait-list count accurate when a waiting call is dropped.
struct WaitingGuard<'a> {
    inner: &'a QueueInner,
}

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.inner.waiting.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A dispatch slot. Dropping it admits the next waiting call.
#[derive(Debug)]
pub struct QueuePermit {
    inner: Arc<QueueInner>,
    _slot: OwnedSemaphorePermit,
}

impl Drop for QueuePermit {
    fn drop(&mut self) {
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
        metrics::record_queue(self.inner.status());
    }
}
