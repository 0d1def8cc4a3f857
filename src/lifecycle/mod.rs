//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Register resources ("Init...") → Bind → Serve
//!
//! Signals (signals.rs):
//!     SIGINT/SIGTERM/SIGUSR1/SIGUSR2 → ShutdownSequencer::request_shutdown
//!
//! Shutdown (shutdown.rs):
//!     Latch → ServerProcess::close (stop listener, hooks.rs settles all)
//!           → log outcome → "Server stopped." → exit(code)
//! ```
//!
//! # Design Decisions
//! - Ordered startup: resources first, then the listener
//! - Process exit is strictly after every close hook has settled
//! - Shutdown timeout is optional: forced exit after deadline

pub mod hooks;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use hooks::{AggregateShutdownError, HookRegistry, HookReport};
pub use shutdown::{ProcessExit, ShutdownSequencer, ShutdownState, ShutdownTrigger, StdProcessExit};
