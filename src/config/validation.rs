//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (interval and probe timeout within 1s..=7 days)
//! - Check the storage section is usable
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Target entries are NOT validated here: a bad target only drops that
//!   target when the scheduler builds its probers

use std::net::SocketAddr;
use thiserror::Error;
use crate::config::schema::MonitorConfig;

/// Longest accepted interval or probe timeout: one week.
pub const MAX_PERIOD_SECS: u64 = 7 * 24 * 60 * 60;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("interval must be greater than zero")]
    ZeroInterval,

    #[error("interval must be at most one week, got {0} seconds")]
    IntervalTooLarge(u64),

    #[error("probe_timeout_secs must be greater than zero")]
    ZeroProbeTimeout,

    #[error("probe_timeout_secs must be at most one week, got {0} seconds")]
    ProbeTimeoutTooLarge(u64),

    #[error("unsupported storage type '{0}'")]
    UnsupportedStorage(String),

    #[error("storage.{0} is required for postgres storage")]
    MissingStorageField(&'static str),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),
}

/// Validate a parsed configuration.
pub fn validate_config(config: &MonitorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    match config.interval {
        0 => errors.push(ValidationError::ZeroInterval),
        secs if secs > MAX_PERIOD_SECS => errors.push(ValidationError::IntervalTooLarge(secs)),
        _ => {}
    }
    match config.probe_timeout_secs {
        Some(0) => errors.push(ValidationError::ZeroProbeTimeout),
        Some(secs) if secs > MAX_PERIOD_SECS => {
            errors.push(ValidationError::ProbeTimeoutTooLarge(secs))
        }
        _ => {}
    }

    let storage = &config.storage;
    match storage.kind.as_str() {
        "memory" => {}
        "postgres" => {
            if storage.host.trim().is_empty() {
                errors.push(ValidationError::MissingStorageField("host"));
            }
            if storage.dbname.trim().is_empty() {
                errors.push(ValidationError::MissingStorageField("dbname"));
            }
        }
        other => errors.push(ValidationError::UnsupportedStorage(other.to_string())),
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Render a list of errors as one line.
pub(crate) fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
