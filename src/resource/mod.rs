//! Closable resources registered with the server as plugins.
//!
//! # Data Flow
//! ```text
//! ResourceConfig (name, shutdown_secs, fail_with)
//!     → handle.rs (ResourceHandle)
//!     → registered as a close hook on the ServerProcess
//!     → release() runs exactly once, during shutdown
//! ```
//!
//! # Design Decisions
//! - No real connectivity: a release is a timed delay that may fail
//! - Failures are typed (ResourceReleaseError) and never abort the process

pub mod handle;

pub use handle::{ResourceHandle, ResourceReleaseError};
