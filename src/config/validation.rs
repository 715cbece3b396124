//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check endpoint URLs are well-formed and unique
//! - Validate value ranges (timeouts > 0, thresholds >= 1)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;
use url::Url;

use crate::config::schema::RouterConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("at least one endpoint must be configured")]
    NoEndpoints,

    #[error("invalid endpoint URL '{url}': {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("duplicate endpoint URL '{0}'")]
    DuplicateEndpoint(String),

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("health.latency_alpha must be in (0, 1], got {0}")]
    LatencyAlpha(f64),
}

/// Validate a configuration, collecting every error found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.endpoints.is_empty() {
        errors.push(ValidationError::NoEndpoints);
    }

    let mut seen = HashSet::new();
    for endpoint in &config.endpoints {
        match Url::parse(endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => errors.push(ValidationError::InvalidEndpoint {
                url: endpoint.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            }),
            Err(e) => errors.push(ValidationError::InvalidEndpoint {
                url: endpoint.clone(),
                reason: e.to_string(),
            }),
        }
        if !seen.insert(endpoint.as_str()) {
            errors.push(ValidationError::DuplicateEndpoint(endpoint.clone()));
        }
    }

    let zero_checks: [(&'static str, bool); 7] = [
        ("queue.max_concurrent", config.queue.max_concurrent == 0),
        ("queue.max_queue_depth", config.queue.max_queue_depth == 0),
        ("health.consecutive_failure_threshold", config.health.consecutive_failure_threshold == 0),
        ("health.probe_interval_secs", config.health.probe_interval_secs == 0),
        ("health.probe_timeout_secs", config.health.probe_timeout_secs == 0),
        ("timeouts.attempt_ms", config.timeouts.attempt_ms == 0),
        ("retries.max_attempts", config.retries.max_attempts == Some(0)),
    ];
    for (field, is_zero) in zero_checks {
        if is_zero {
            errors.push(ValidationError::Zero { field });
        }
    }
    if config.timeouts.call_deadline_ms == Some(0) {
        errors.push(ValidationError::Zero { field: "timeouts.call_deadline_ms" });
    }

    let alpha = config.health.latency_alpha;
    if !(alpha > 0.0 && alpha <= 1.0) {
        errors.push(ValidationError::LatencyAlpha(alpha));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
