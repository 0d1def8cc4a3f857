//! Server process with ordered, awaited asynchronous shutdown.
//!
//! Resources (mock database connections) register close hooks on a
//! [`ServerProcess`]. On a termination signal the [`ShutdownSequencer`]
//! closes the server, waits for every hook to settle, logs the outcome and
//! only then exits the process.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resource;

pub use config::schema::ServerConfig;
pub use http::ServerProcess;
pub use lifecycle::{ShutdownSequencer, ShutdownState};
pub use resource::ResourceHandle;
