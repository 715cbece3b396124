//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Passive tracking (tracker.rs):
//!     Call outcome observed
//!     → requestCount / errorCount / latency updated
//!     → Unhealthy once consecutive failures reach the threshold
//!
//! Active probing (active.rs):
//!     Periodic timer
//!     → Probe unhealthy or idle endpoints
//!     → Results recorded through tracker.rs
//! ```
//!
//! # Design Decisions
//! - Active and passive checks are complementary
//! - Only the tracker writes endpoint records
//! - A probe success is the only way an endpoint recovers without traffic

pub mod active;
pub mod tracker;

pub use active::{HealthMonitor, ProbeRound};
pub use tracker::HealthTracker;
