//! HTTP server and resource holder.
//!
//! # Responsibilities
//! - Create Axum Router with the status handler
//! - Wire up middleware (tracing, request timeout)
//! - Register resources as plugins, each with a close hook
//! - Serve on a listener until closed
//! - Close: stop accepting, drain the listener task, settle every hook

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::validation::ValidationError;
use crate::config::ServerConfig;
use crate::lifecycle::hooks::{AggregateShutdownError, HookRegistry};
use crate::resource::{ResourceHandle, ResourceReleaseError};

/// Application state injected into handlers.
#[derive(Clone)]
struct AppState {
    resources: Arc<Mutex<Vec<String>>>,
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: &'static str,
    resources: Vec<String>,
}

/// The server/resource holder: listens for HTTP and owns the close hooks.
pub struct ServerProcess {
    config: ServerConfig,
    hooks: HookRegistry,
    resources: Arc<Mutex<Vec<String>>>,
    stop_tx: broadcast::Sender<()>,
    serve_task: Mutex<Option<JoinHandle<std::io::Result<()>>>>,
}

impl ServerProcess {
    /// Create a new server with the given configuration.
    ///
    /// Resources from the config are not registered here; see
    /// `lifecycle::startup`.
    pub fn new(config: ServerConfig) -> Self {
        let (stop_tx, _) = broadcast::channel(1);
        Self {
            config,
            hooks: HookRegistry::new(),
            resources: Arc::new(Mutex::new(Vec::new())),
            stop_tx,
            serve_task: Mutex::new(None),
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(&self) -> Router {
        let state = AppState {
            resources: self.resources.clone(),
        };

        #[allow(deprecated)]
        let timeout = TimeoutLayer::new(Duration::from_secs(self.config.listener.request_timeout_secs));

        Router::new()
            .route("/health", get(status_handler))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(timeout),
            )
    }

    /// Register a resource as a plugin: its release becomes a close hook.
    ///
    /// Names are unique; registering a name twice is rejected.
    pub fn register_resource(&self, resource: ResourceHandle) -> Result<(), ValidationError> {
        {
            let mut resources = self.resources.lock().expect("resource list mutex poisoned");
            if resources.iter().any(|name| name == resource.name()) {
                return Err(ValidationError::DuplicateResource(resource.name().to_string()));
            }
            resources.push(resource.name().to_string());
        }

        tracing::info!(resource = %resource.name(), "Init...");

        self.hooks
            .register(resource.name().to_string(), move || async move {
                resource.release().await
            });
        Ok(())
    }

    /// Register an application-level close hook.
    pub fn add_hook<F, Fut>(&self, name: impl Into<String>, hook: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<(), ResourceReleaseError>> + Send + 'static,
    {
        self.hooks.register(name, hook);
    }

    /// Names of the registered resources, in registration order.
    pub fn resource_names(&self) -> Vec<String> {
        self.resources
            .lock()
            .expect("resource list mutex poisoned")
            .clone()
    }

    /// Number of close hooks that have not run yet.
    pub fn pending_hooks(&self) -> usize {
        self.hooks.len()
    }

    /// Start serving on the given listener in a background task.
    pub fn start(&self, listener: TcpListener) -> Result<SocketAddr, std::io::Error> {
        let addr = listener.local_addr()?;
        let app = self.build_router();
        let mut stop_rx = self.stop_tx.subscribe();

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stop_rx.recv().await;
                })
                .await
        });

        *self.serve_task.lock().expect("serve task mutex poisoned") = Some(task);

        tracing::info!(address = %addr, "Server listening");
        Ok(addr)
    }

    /// Close the server.
    ///
    /// Stops the listener, waits for in-flight requests to drain, then runs
    /// every close hook. Resolves only once all hooks have settled.
    pub async fn close(&self) -> Result<(), AggregateShutdownError> {
        let _ = self.stop_tx.send(());

        let task = self.serve_task.lock().expect("serve task mutex poisoned").take();
        if let Some(task) = task {
            match task.await {
                Ok(Ok(())) => tracing::debug!("Listener stopped"),
                Ok(Err(e)) => tracing::warn!(error = %e, "Listener exited with error"),
                Err(e) => tracing::warn!(error = %e, "Listener task failed"),
            }
        }

        let report = self.hooks.run_all().await;
        tracing::debug!(settled = report.settled, failed = report.failures.len(), "Close hooks settled");
        report.into_result().map(|_| ())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

async fn status_handler(State(state): State<AppState>) -> Json<StatusBody> {
    let resources = state
        .resources
        .lock()
        .expect("resource list mutex poisoned")
        .clone();

    Json(StatusBody {
        status: "ok",
        resources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn server() -> ServerProcess {
        let mut config = ServerConfig::default();
        config.resources.clear();
        ServerProcess::new(config)
    }

    #[tokio::test]
    async fn test_close_without_start_runs_hooks() {
        let server = server();
        let ran = Arc::new(AtomicBool::new(false));
        let flag = ran.clone();
        server.add_hook("app", move || async move {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(server.pending_hooks(), 1);
        server.close().await.unwrap();

        assert!(ran.load(Ordering::SeqCst));
        assert_eq!(server.pending_hooks(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_reports_failed_resource() {
        let server = server();
        server
            .register_resource(
                ResourceHandle::new("FlakyDB", Duration::from_millis(100)).failing_with("gone"),
            )
            .unwrap();
        server
            .register_resource(ResourceHandle::new("SecondDB", Duration::from_secs(1)))
            .unwrap();

        assert_eq!(server.resource_names(), vec!["FlakyDB", "SecondDB"]);

        let err = server.close().await.unwrap_err();
        assert_eq!(err.errors.len(), 1);
        assert_eq!(err.errors[0].resource, "FlakyDB");
    }

    #[test]
    fn test_duplicate_resource_rejected() {
        let server = server();
        server
            .register_resource(ResourceHandle::new("DB", Duration::from_secs(1)))
            .unwrap();

        let err = server
            .register_resource(ResourceHandle::new("DB", Duration::from_secs(2)))
            .unwrap_err();

        assert_eq!(err, ValidationError::DuplicateResource("DB".into()));
        assert_eq!(server.resource_names(), vec!["DB"]);
        assert_eq!(server.pending_hooks(), 1);
    }
}
