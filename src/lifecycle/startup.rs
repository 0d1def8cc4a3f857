//! Startup orchestration.
//!
//! # Responsibilities
//! - Register every configured resource with the server, in order
//! - Bind the listener and begin accepting traffic
//! - Assemble the shutdown sequencer around the running server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when resources are registered)

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::validation::{validate_config, ValidationError};
use crate::config::ServerConfig;
use crate::http::ServerProcess;
use crate::lifecycle::shutdown::{ProcessExit, ShutdownSequencer};
use crate::resource::ResourceHandle;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {}", join_errors(.0))]
    Config(Vec<ValidationError>),

    #[error("invalid resource: {0}")]
    Resource(#[from] ValidationError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// A started server together with its shutdown sequencer.
pub struct Launched {
    pub sequencer: Arc<ShutdownSequencer>,
    pub local_addr: SocketAddr,
}

/// Create the server and register every configured resource as a plugin.
///
/// The config is validated first, so configs built in code get the same
/// checks as ones loaded from disk.
pub fn build_server(config: ServerConfig) -> Result<Arc<ServerProcess>, StartupError> {
    validate_config(&config).map_err(StartupError::Config)?;

    let handles = config
        .resources
        .iter()
        .map(ResourceHandle::from_config)
        .collect::<Result<Vec<_>, _>>()?;

    let server = Arc::new(ServerProcess::new(config));
    for handle in handles {
        server.register_resource(handle)?;
    }

    server.add_hook("app", || async {
        tracing::info!("Application close hook ran");
        Ok(())
    });

    Ok(server)
}

/// Build, bind and start the server; wire the sequencer to `exit`.
pub async fn launch(
    config: ServerConfig,
    exit: Arc<dyn ProcessExit>,
) -> Result<Launched, StartupError> {
    let address = config.listener.bind_address.clone();
    let timeout = config.shutdown.timeout();

    let server = build_server(config)?;

    let bind_err = |source: std::io::Error| StartupError::Bind {
        address: address.clone(),
        source,
    };
    let listener = TcpListener::bind(&address).await.map_err(bind_err)?;
    let local_addr = server.start(listener).map_err(bind_err)?;

    let sequencer = Arc::new(ShutdownSequencer::new(server, exit).with_timeout(timeout));

    Ok(Launched {
        sequencer,
        local_addr,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResourceConfig;

    #[test]
    fn test_build_registers_resources_and_app_hook() {
        let server = build_server(ServerConfig::default()).unwrap();

        assert_eq!(server.resource_names(), vec!["FirstDB", "SecondDB"]);
        assert_eq!(server.pending_hooks(), 3);
    }

    #[test]
    fn test_build_rejects_negative_duration() {
        let mut config = ServerConfig::default();
        config.resources = vec![ResourceConfig::new("BadDB", -3.0)];

        let err = build_server(config).err().unwrap();
        assert!(matches!(err, StartupError::Config(_)));
    }

    #[test]
    fn test_build_rejects_duplicate_names() {
        let mut config = ServerConfig::default();
        config.resources = vec![ResourceConfig::new("DB", 1.0), ResourceConfig::new("DB", 2.0)];

        let err = build_server(config).err().unwrap();
        match err {
            StartupError::Config(errors) => {
                assert_eq!(errors, vec![ValidationError::DuplicateResource("DB".into())])
            }
            other => panic!("unexpected error: {}", other),
        }
    }
}
