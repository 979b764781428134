//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, pool size > 0)
//! - Validate addresses parse before anything binds
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ServiceConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid socket address for {field}: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
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

    let mysql = &config.mysql;
    if mysql.host.trim().is_empty() {
        errors.push(ValidationError::Empty("mysql.host"));
    }
    if mysql.user.trim().is_empty() {
        errors.push(ValidationError::Empty("mysql.user"));
    }
    if mysql.database.trim().is_empty() {
        errors.push(ValidationError::Empty("mysql.database"));
    }
    if mysql.connection_limit == 0 {
        errors.push(ValidationError::Zero("mysql.connection_limit"));
    }

    let health = &config.health_check;
    if health.interval_secs == 0 {
        errors.push(ValidationError::Zero("health_check.interval_secs"));
    }
    if health.probe_timeout_ms == 0 {
        errors.push(ValidationError::Zero("health_check.probe_timeout_ms"));
    }
    if health.retry_interval_ms == 0 {
        errors.push(ValidationError::Zero("health_check.retry_interval_ms"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
