//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Resource names are present and unique
//! - Value ranges (durations non-negative, timeouts > 0, address parses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    InvalidBindAddress(String),

    #[error("resource at position {0} has an empty name")]
    EmptyResourceName(usize),

    #[error("resource '{0}' is registered more than once")]
    DuplicateResource(String),

    #[error("resource '{resource}' has invalid shutdown_secs {secs} (must be a finite, non-negative number)")]
    InvalidShutdownDuration { resource: String, secs: f64 },

    #[error("shutdown.signals must list at least one signal")]
    NoShutdownSignals,

    #[error("shutdown.timeout_secs must be greater than zero")]
    ZeroShutdownTimeout,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    let mut seen = HashSet::new();
    for (idx, resource) in config.resources.iter().enumerate() {
        if resource.name.trim().is_empty() {
            errors.push(ValidationError::EmptyResourceName(idx));
        } else if !seen.insert(resource.name.as_str()) {
            errors.push(ValidationError::DuplicateResource(resource.name.clone()));
        }

        if let Err(e) = resource.shutdown_duration() {
            errors.push(e);
        }
    }

    if config.shutdown.signals.is_empty() {
        errors.push(ValidationError::NoShutdownSignals);
    }

    if config.shutdown.timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroShutdownTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
