//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Backend URLs parse, are plain http, and are unique
//! - Limits and timeouts are non-zero, addresses parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;
use crate::config::schema::BalancerConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("at least one backend is required")]
    NoBackends,
    #[error("backend url `{0}` does not parse")]
    InvalidBackendUrl(String),
    #[error("backend url `{0}` must use http")]
    UnsupportedScheme(String),
    #[error("backend url `{0}` is listed more than once")]
    DuplicateBackend(String),
    #[error("retries.attempt_limit must be at least 1")]
    ZeroAttemptLimit,
    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),
    #[error("{field} `{value}` is not a socket address")]
    InvalidAddress { field: &'static str, value: String },
    #[error("forwarding header `{0}` is not a valid header")]
    InvalidHeader(String),
}

pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    let mut seen = HashSet::new();
    for backend in &config.backends {
        match Url::parse(&backend.url) {
            Ok(url) => {
                if url.scheme() != "http" {
                    errors.push(ValidationError::UnsupportedScheme(backend.url.clone()));
                }
                if !seen.insert(url) {
                    errors.push(ValidationError::DuplicateBackend(backend.url.clone()));
                }
            }
            Err(_) => errors.push(ValidationError::InvalidBackendUrl(backend.url.clone())),
        }
    }

    if config.retries.attempt_limit == 0 {
        errors.push(ValidationError::ZeroAttemptLimit);
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("upstream_secs"));
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(&mut errors, "observability.metrics_address", &config.observability.metrics_address);
    }
    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }

    for header in &config.forwarding.set_headers {
        if HeaderName::try_from(header.name.as_str()).is_err()
            || HeaderValue::try_from(header.value.as_str()).is_err()
        {
            errors.push(ValidationError::InvalidHeader(header.name.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
