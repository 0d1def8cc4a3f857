//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::validation::ValidationError;

/// Root configuration for the server process.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address, request timeout).
    pub listener: ListenerConfig,

    /// Mock resources registered as plugins, in registration order.
    pub resources: Vec<ResourceConfig>,

    /// Shutdown behaviour (signals, exit code, deadline).
    pub shutdown: ShutdownConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            resources: vec![
                ResourceConfig::new("FirstDB", 5.0),
                ResourceConfig::new("SecondDB", 1.0),
            ],
            shutdown: ShutdownConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:3000").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// A simulated closable dependency.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResourceConfig {
    /// Unique resource identifier, used as the log prefix.
    pub name: String,

    /// Time the release takes, in (fractional) seconds.
    #[serde(default)]
    pub shutdown_secs: f64,

    /// When set, the release fails with this message after the delay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_with: Option<String>,
}

impl ResourceConfig {
    pub fn new(name: impl Into<String>, shutdown_secs: f64) -> Self {
        Self {
            name: name.into(),
            shutdown_secs,
            fail_with: None,
        }
    }

    /// Release delay as a `Duration`.
    ///
    /// Negative, NaN and overflowing values are rejected instead of panicking.
    pub fn shutdown_duration(&self) -> Result<Duration, ValidationError> {
        Duration::try_from_secs_f64(self.shutdown_secs).map_err(|_| {
            ValidationError::InvalidShutdownDuration {
                resource: self.name.clone(),
                secs: self.shutdown_secs,
            }
        })
    }
}

/// OS signals that can trigger a shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ShutdownSignal {
    Sigint,
    Sigterm,
    Sigusr1,
    Sigusr2,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShutdownSignal::Sigint => "SIGINT",
            ShutdownSignal::Sigterm => "SIGTERM",
            ShutdownSignal::Sigusr1 => "SIGUSR1",
            ShutdownSignal::Sigusr2 => "SIGUSR2",
        };
        f.write_str(name)
    }
}

/// Shutdown configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ShutdownConfig {
    /// Signals mapped to the shutdown entry point.
    pub signals: Vec<ShutdownSignal>,

    /// Exit code used when a signal triggers the shutdown.
    pub exit_code: i32,

    /// Optional ceiling on the close operation, in seconds.
    /// Unset means wait for every hook, however long it takes.
    pub timeout_secs: Option<u64>,
}

impl ShutdownConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            signals: vec![
                ShutdownSignal::Sigint,
                ShutdownSignal::Sigterm,
                ShutdownSignal::Sigusr2,
            ],
            exit_code: 0,
            timeout_secs: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
