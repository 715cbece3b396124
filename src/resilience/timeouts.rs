//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap endpoint attempts and probes with a deadline
//! - Cancel the attempt cleanly on expiry (the future is dropped)
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities, so tests can drive a paused clock
//! - Timeout errors are distinct from other transport errors

use std::future::Future;
use std::time::Duration;

use crate::transport::{RpcReply, TransportError};

/// Run one attempt under `limit`, mapping expiry to [`TransportError::Timeout`].
pub async fn with_timeout<F>(limit: Duration, attempt: F) -> Result<RpcReply, TransportError>
where
    F: Future<Output = Result<RpcReply, TransportError>>,
{
    match tokio::time::timeout(limit, attempt).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(limit)),
    }
}
