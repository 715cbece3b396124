//! Per-call state machine.
//!
//! # States
//! ```text
//! Queued → Dispatching(E) → Succeeded
//!                         → Failed(E) → Dispatching(E') → ...
//!                         → Exhausted
//! ```
//!
//! # Design Decisions
//! - Transitions are plain methods with no I/O, so retry policy is unit-testable
//! - Each endpoint is tried at most once per call
//! - A request-level protocol error ends the call immediately

use std::collections::HashSet;
use std::mem;
use std::time::Duration;

use crate::error::{AttemptFailure, RpcError};
use crate::resilience::retries::is_retryable;
use crate::transport::{JsonRpcRequest, TransportError};

/// Lifecycle of one logical call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallState {
    /// Waiting for a dispatch slot or for the next endpoint.
    Queued,
    /// An attempt is in flight against `endpoint`.
    Dispatching { endpoint: String, attempt: usize },
    /// The attempt against `endpoint` failed; another endpoint will be tried.
    Failed { endpoint: String, attempt: usize },
    /// Terminal: `endpoint` answered.
    Succeeded { endpoint: String, attempt: usize },
    /// Terminal: no further attempt will be made.
    Exhausted,
}

impl CallState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, CallState::Succeeded { .. } | CallState::Exhausted)
    }
}

/// A caller's request plus everything needed to decide what happens next.
#[derive(Debug)]
pub struct PendingCall {
    request: JsonRpcRequest,
    state: CallState,
    max_attempts: usize,
    attempts: usize,
    tried: HashSet<String>,
    failures: Vec<AttemptFailure>,
    rejected: Option<(i64, String)>,
}

impl PendingCall {
    pub fn new(request: JsonRpcRequest, max_attempts: usize) -> Self {
        Self {
            request,
            state: CallState::Queued,
            max_attempts: max_attempts.max(1),
            attempts: 0,
            tried: HashSet::new(),
            failures: Vec::new(),
            rejected: None,
        }
    }

    pub fn request(&self) -> &JsonRpcRequest {
        &self.request
    }

    pub fn state(&self) -> &CallState {
        &self.state
    }

    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Endpoints already tried for this call.
    pub fn excluded(&self) -> &HashSet<String> {
        &self.tried
    }

    pub fn failures(&self) -> &[AttemptFailure] {
        &self.failures
    }

    /// `Queued | Failed → Dispatching(endpoint)`.
    pub fn dispatch(&mut self, endpoint: &str) -> &CallState {
        if matches!(self.state, CallState::Queued | CallState::Failed { .. }) {
            self.attempts += 1;
            self.tried.insert(endpoint.to_string());
            self.state = CallState::Dispatching {
                endpoint: endpoint.to_string(),
                attempt: self.attempts,
            };
        }
        &self.state
    }

    /// `Dispatching(E) → Succeeded(E)`.
    pub fn succeed(&mut self) -> &CallState {
        if let CallState::Dispatching { endpoint, attempt } = &self.state {
            self.state = CallState::Succeeded {
                endpoint: endpoint.clone(),
                attempt: *attempt,
            };
        }
        &self.state
    }

    /// `Dispatching(E) → Failed(E) | Exhausted`.
    pub fn fail(&mut self, error: TransportError) -> &CallState {
        let CallState::Dispatching { endpoint, attempt } = &self.state else {
            return &self.state;
        };
        let (endpoint, attempt) = (endpoint.clone(), *attempt);

        if !is_retryable(&error) {
            if let TransportError::Rpc { code, message } = &error {
                self.rejected = Some((*code, message.clone()));
            }
            self.failures.push(AttemptFailure { endpoint, error });
            self.state = CallState::Exhausted;
            return &self.state;
        }

        self.failures.push(AttemptFailure {
            endpoint: endpoint.clone(),
            error,
        });
        self.state = if self.attempts >= self.max_attempts {
            CallState::Exhausted
        } else {
            CallState::Failed { endpoint, attempt }
        };
        &self.state
    }

    /// No endpoint is available for the next attempt.
    pub fn exhaust(&mut self) -> &CallState {
        if !self.state.is_terminal() {
            self.state = CallState::Exhausted;
        }
        &self.state
    }

    /// The error to surface once the call is exhausted. Drains the recorded failures.
    pub fn take_error(&mut self) -> RpcError {
        if let Some((code, message)) = self.rejected.take() {
            return RpcError::Protocol { code, message };
        }
        if self.failures.is_empty() {
            RpcError::NoHealthyEndpoint
        } else {
            RpcError::Exhausted {
                failures: mem::take(&mut self.failures),
            }
        }
    }

    /// The caller's deadline expired; ends the call and keeps the failures seen so far.
    pub fn timed_out(&mut self, after: Duration) -> RpcError {
        self.exhaust();
        RpcError::Timeout {
            after,
            failures: mem::take(&mut self.failures),
        }
    }
}
