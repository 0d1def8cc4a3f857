//! Mock database connection with a simulated release delay.

use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

use crate::config::schema::ResourceConfig;
use crate::config::validation::ValidationError;

/// Boxed underlying cause of a failed release.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// A resource failed to release during shutdown.
#[derive(Debug, Error)]
#[error("failed to release '{resource}': {cause}")]
pub struct ResourceReleaseError {
    /// Name of the resource (or hook) that failed.
    pub resource: String,
    #[source]
    pub cause: BoxError,
}

impl ResourceReleaseError {
    pub fn new(resource: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self {
            resource: resource.into(),
            cause: cause.into(),
        }
    }
}

/// Cause used when a configured resource is told to fail.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct SimulatedFailure(pub String);

/// One closable dependency.
#[derive(Debug, Clone)]
pub struct ResourceHandle {
    name: String,
    shutdown_duration: Duration,
    failure: Option<String>,
}

impl ResourceHandle {
    /// Create a handle that releases successfully after `shutdown_duration`.
    pub fn new(name: impl Into<String>, shutdown_duration: Duration) -> Self {
        Self {
            name: name.into(),
            shutdown_duration,
            failure: None,
        }
    }

    /// Make the release fail with `message` once the delay has elapsed.
    pub fn failing_with(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    pub fn from_config(config: &ResourceConfig) -> Result<Self, ValidationError> {
        let handle = Self::new(config.name.clone(), config.shutdown_duration()?);
        Ok(match &config.fail_with {
            Some(message) => handle.failing_with(message.clone()),
            None => handle,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shutdown_duration(&self) -> Duration {
        self.shutdown_duration
    }

    /// Release the resource.
    ///
    /// Logs `Closing...`, waits for the shutdown duration, then logs
    /// `Successful closed`. On failure only the first line is emitted and the
    /// error is returned to the caller.
    pub async fn release(&self) -> Result<(), ResourceReleaseError> {
        tracing::info!(
            resource = %self.name,
            delay_secs = self.shutdown_duration.as_secs_f64(),
            "Closing..."
        );

        tokio::time::sleep(self.shutdown_duration).await;

        if let Some(message) = &self.failure {
            return Err(ResourceReleaseError::new(
                self.name.clone(),
                SimulatedFailure(message.clone()),
            ));
        }

        tracing::info!(resource = %self.name, "Successful closed");
        Ok(())
    }
}
