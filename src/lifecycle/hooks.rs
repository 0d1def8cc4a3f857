//! Close hooks run when the server shuts down.
//!
//! # Responsibilities
//! - Keep cleanup callbacks in registration order
//! - Launch every callback together and wait for all of them to settle
//! - Fold individual failures into one aggregate error
//!
//! # Design Decisions
//! - Callbacks are `FnOnce`: `run_all` drains the registry, so a callback can
//!   never run twice
//! - Each callback runs on its own task; a panic is reported as a failure of
//!   that hook instead of tearing down the whole shutdown
//! - Settle-all, collect-errors: one failure never stops the others

use std::future::Future;
use std::sync::Mutex;
use std::time::Instant;

use futures_util::future::{join_all, BoxFuture, FutureExt};
use thiserror::Error;

use crate::observability::metrics;
use crate::resource::ResourceReleaseError;

/// Future returned by a close hook.
pub type HookFuture = BoxFuture<'static, Result<(), ResourceReleaseError>>;

type Hook = Box<dyn FnOnce() -> HookFuture + Send>;

struct RegisteredHook {
    name: String,
    hook: Hook,
}

/// One or more close hooks failed.
#[derive(Debug, Error)]
#[error("{} close hook(s) failed: {}", .errors.len(), summarize(.errors))]
pub struct AggregateShutdownError {
    /// Failures in registration order.
    pub errors: Vec<ResourceReleaseError>,
}

fn summarize(errors: &[ResourceReleaseError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Outcome of running every registered hook.
#[derive(Debug, Default)]
pub struct HookReport {
    /// Number of hooks that settled (succeeded or failed).
    pub settled: usize,
    /// Failures in registration order.
    pub failures: Vec<ResourceReleaseError>,
}

impl HookReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn into_result(self) -> Result<usize, AggregateShutdownError> {
        if self.failures.is_empty() {
            Ok(self.settled)
        } else {
            Err(AggregateShutdownError {
                errors: self.failures,
            })
        }
    }
}

/// Ordered collection of asynchronous close hooks.
#[derive(Default)]
pub struct HookRegistry {
    hooks: Mutex<Vec<RegisteredHook>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook. No deduplication and no limit on count.
    pub fn register<F, Fut>(&self, name: impl Into<String>, hook: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), ResourceReleaseError>> + Send + 'static,
    {
        let name = name.into();
        tracing::debug!(hook = %name, "Close hook registered");

        self.hooks
            .lock()
            .expect("hook registry mutex poisoned")
            .push(RegisteredHook {
                name,
                hook: Box::new(move || hook().boxed()),
            });
    }

    /// Number of hooks still waiting to run.
    pub fn len(&self) -> usize {
        self.hooks.lock().expect("hook registry mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Names of the pending hooks, in registration order.
    pub fn names(&self) -> Vec<String> {
        self.hooks
            .lock()
            .expect("hook registry mutex poisoned")
            .iter()
            .map(|h| h.name.clone())
            .collect()
    }

    /// Run every registered hook and wait until all of them have settled.
    ///
    /// Hooks are drained from the registry; calling this again runs only hooks
    /// registered since the previous call.
    pub async fn run_all(&self) -> HookReport {
        let hooks = std::mem::take(&mut *self.hooks.lock().expect("hook registry mutex poisoned"));
        if hooks.is_empty() {
            return HookReport::default();
        }

        tracing::debug!(count = hooks.len(), "Running close hooks");

        let running = hooks.into_iter().map(|RegisteredHook { name, hook }| {
            let started = Instant::now();
            let task = tokio::spawn(async move { hook().await });
            async move {
                let result = match task.await {
                    Ok(result) => result,
                    Err(join_err) => Err(ResourceReleaseError::new(
                        name.clone(),
                        format!("close hook aborted: {}", join_err),
                    )),
                };
                metrics::record_hook_settled(&name, result.is_ok(), started);
                result
            }
        });

        let results = join_all(running).await;
        let settled = results.len();
        let failures: Vec<_> = results.into_iter().filter_map(Result::err).collect();

        for failure in &failures {
            tracing::debug!(resource = %failure.resource, error = %failure.cause, "Close hook failed");
        }

        HookReport { settled, failures }
    }
}
