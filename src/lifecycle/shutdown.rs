//! Shutdown coordination for the server process.
//!
//! # Responsibilities
//! - Accept shutdown requests from signals or explicit callers
//! - Run the server's close operation once and wait for it to settle
//! - Terminate the process exactly once, with the requested exit code
//!
//! # Design Decisions
//! - One-shot latch: the first request wins, later ones are ignored
//! - The close operation is always awaited before exiting; a close that is
//!   fired and not awaited lets the process exit with cleanup still pending
//! - Close failures are logged and never change the exit code

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::ShutdownSignal;
use crate::http::ServerProcess;
use crate::observability::metrics;

/// Conceptual states of the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ShutdownState {
    Running = 0,
    ClosingRequested = 1,
    ClosingInProgress = 2,
    Closed = 3,
    ClosedWithErrors = 4,
}

impl ShutdownState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ShutdownState::Running,
            1 => ShutdownState::ClosingRequested,
            2 => ShutdownState::ClosingInProgress,
            3 => ShutdownState::Closed,
            4 => ShutdownState::ClosedWithErrors,
            other => unreachable!("invalid shutdown state byte {}", other),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ShutdownState::Running => "running",
            ShutdownState::ClosingRequested => "closing_requested",
            ShutdownState::ClosingInProgress => "closing_in_progress",
            ShutdownState::Closed => "closed",
            ShutdownState::ClosedWithErrors => "closed_with_errors",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ShutdownState::Closed | ShutdownState::ClosedWithErrors)
    }
}

impl fmt::Display for ShutdownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What asked for the shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownTrigger {
    Signal(ShutdownSignal),
    Explicit,
}

impl fmt::Display for ShutdownTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownTrigger::Signal(signal) => write!(f, "{}", signal),
            ShutdownTrigger::Explicit => f.write_str("explicit"),
        }
    }
}

/// Terminates the process.
pub trait ProcessExit: Send + Sync {
    fn exit(&self, code: i32);
}

/// Exits through `std::process::exit`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdProcessExit;

impl ProcessExit for StdProcessExit {
    fn exit(&self, code: i32) {
        std::process::exit(code)
    }
}

/// One-shot orchestrator ensuring cleanup completes before process exit.
pub struct ShutdownSequencer {
    server: Arc<ServerProcess>,
    exit: Arc<dyn ProcessExit>,
    timeout: Option<Duration>,
    state: AtomicU8,
}

impl ShutdownSequencer {
    pub fn new(server: Arc<ServerProcess>, exit: Arc<dyn ProcessExit>) -> Self {
        Self {
            server,
            exit,
            timeout: None,
            state: AtomicU8::new(ShutdownState::Running as u8),
        }
    }

    /// Bound the close operation. Once elapsed, shutdown force-completes.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn state(&self) -> ShutdownState {
        ShutdownState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn server(&self) -> &Arc<ServerProcess> {
        &self.server
    }

    fn set_state(&self, state: ShutdownState) {
        self.state.store(state as u8, Ordering::Release);
    }

    /// Close the server and exit the process.
    ///
    /// Only the first call does anything; it returns the terminal state it
    /// reached before exiting. Calls made while a shutdown is already under
    /// way return `None` immediately.
    pub async fn request_shutdown(
        &self,
        trigger: ShutdownTrigger,
        exit_code: i32,
    ) -> Option<ShutdownState> {
        if self
            .state
            .compare_exchange(
                ShutdownState::Running as u8,
                ShutdownState::ClosingRequested as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            tracing::debug!(trigger = %trigger, state = %self.state(), "Shutdown already in progress, ignoring");
            metrics::record_ignored_request();
            return None;
        }

        let started = Instant::now();
        match trigger {
            ShutdownTrigger::Signal(signal) => {
                tracing::info!(signal = %signal, "Caught signal, closing server")
            }
            ShutdownTrigger::Explicit => tracing::info!("Shutdown requested, closing server"),
        }

        self.set_state(ShutdownState::ClosingInProgress);

        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.server.close()).await {
                Ok(result) => result.map_err(|e| e.to_string()),
                Err(_) => {
                    tracing::warn!(timeout_secs = limit.as_secs_f64(), "Close did not finish in time, forcing shutdown");
                    Err(format!("close timed out after {:?}", limit))
                }
            },
            None => self.server.close().await.map_err(|e| e.to_string()),
        };

        let terminal = match outcome {
            Ok(()) => {
                tracing::info!("Server closed cleanly");
                ShutdownState::Closed
            }
            Err(error) => {
                tracing::error!(error = %error, "Server closed with errors");
                ShutdownState::ClosedWithErrors
            }
        };
        self.set_state(terminal);
        metrics::record_shutdown(terminal, started);

        tracing::info!(exit_code, "Server stopped.");
        self.exit.exit(exit_code);

        Some(terminal)
    }
}
