//! Configuration validation.
//!
//! Serde handles syntax; this checks value ranges. All problems are
//! reported at once, not just the first.

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::LuminaryConfig;
use crate::proxy::types::DEFAULT_TIMEOUT_SECS;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} is not a valid socket address: '{value}'")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("server.request_timeout_secs must exceed the default proxy timeout of {min}s, got {value}")]
    RequestTimeoutTooShort { value: u64, min: u64 },
}

/// Validate a parsed configuration.
pub fn validate_config(config: &LuminaryConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "server.bind_address",
            value: config.server.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let positives = [
        ("server.request_timeout_secs", config.server.request_timeout_secs),
        ("spec.fetch_timeout_secs", config.spec.fetch_timeout_secs),
        ("spec.max_concurrent_fetches", config.spec.max_concurrent_fetches as u64),
        ("proxy.shared_client_timeout_secs", config.proxy.shared_client_timeout_secs),
    ];
    for (field, value) in positives {
        if value == 0 {
            errors.push(ValidationError::Zero(field));
        }
    }

    // Proxy timeouts must stay below the inbound deadline, so the default has to fit.
    let request_timeout = config.server.request_timeout_secs;
    if request_timeout != 0 && (request_timeout as f64) <= DEFAULT_TIMEOUT_SECS {
        errors.push(ValidationError::RequestTimeoutTooShort {
            value: request_timeout,
            min: DEFAULT_TIMEOUT_SECS as u64,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
