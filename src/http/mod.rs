//! HTTP layer: the server that holds resources and their close hooks.
//!
//! # Data Flow
//! ```text
//! startup.rs registers resources
//!     → server.rs (ServerProcess: router, listener task, HookRegistry)
//!     → close() stops the listener, then settles every hook
//! ```
//!
//! # Design Decisions
//! - Only a status endpoint; the server exists to own the shutdown hooks
//! - Close is async and must be awaited by whoever exits the process

pub mod server;

pub use server::ServerProcess;
