//! Endpoint registry subsystem.
//!
//! # Data Flow
//! ```text
//! RouterConfig.endpoints (ordered)
//!     → registry.rs (one record per URL, priority = position)
//!     → health tracker mutates records
//!     → selector / status surface read snapshots
//! ```

pub mod record;
pub mod registry;

pub use record::EndpointRecord;
pub use registry::EndpointRegistry;
