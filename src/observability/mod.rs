//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Manager, queue and health tracker produce:
//!     → logging.rs (structured log events, one span per logical call)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
