//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Attempt against an endpoint:
//!     → timeouts.rs (enforce the per-attempt deadline)
//!     → On failure: retries.rs (fail over, or stop if the request itself is at fault)
//!     → backoff.rs (pause before the next endpoint)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Each endpoint is tried at most once per logical call
//! - Jittered backoff prevents thundering herd

pub mod backoff;
pub mod retries;
pub mod timeouts;
