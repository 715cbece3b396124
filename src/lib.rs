//! Client-side JSON-RPC routing.
//!
//! Holds a pool of endpoints, tracks their health and latency, routes each call to
//! the best available endpoint, fails over on error and bounds concurrency through
//! a FIFO request queue.

pub mod admin;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod health;
pub mod lifecycle;
pub mod load_balancer;
pub mod manager;
pub mod observability;
pub mod queue;
pub mod resilience;
pub mod transport;

pub use config::RouterConfig;
pub use endpoint::EndpointRecord;
pub use error::{AttemptFailure, RpcError};
pub use lifecycle::Shutdown;
pub use manager::{CallOptions, RpcManager, StatusReport};
pub use queue::QueueStatus;
pub use transport::{HttpTransport, RpcTransport};
