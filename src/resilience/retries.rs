//! Retry classification.
//!
//! # Responsibilities
//! - Decide whether a failed attempt should fail over to another endpoint
//!
//! # Design Decisions
//! - Timeouts, connection errors, HTTP errors and malformed bodies are endpoint faults
//! - JSON-RPC errors are endpoint faults unless the code blames the request itself
//! - Rate limiting (HTTP 429, -32005) is always retried elsewhere

use crate::transport::TransportError;

/// The request object is not a valid JSON-RPC request.
pub const INVALID_REQUEST: i64 = -32600;
/// Invalid method parameters.
pub const INVALID_PARAMS: i64 = -32602;
/// Execution reverted (eth_call / eth_estimateGas).
pub const EXECUTION_REVERTED: i64 = 3;

/// Codes that describe a problem with the request rather than the endpoint.
const CALLER_FAULT_CODES: [i64; 3] = [INVALID_REQUEST, INVALID_PARAMS, EXECUTION_REVERTED];

/// Whether another endpoint might answer where this one failed.
pub fn is_retryable(error: &TransportError) -> bool {
    match error {
        TransportError::Rpc { code, .. } => !CALLER_FAULT_CODES.contains(code),
        TransportError::Timeout(_)
        | TransportError::Network(_)
        | TransportError::HttpStatus(_)
        | TransportError::Malformed(_) => true,
    }
}
