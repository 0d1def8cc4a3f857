//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for the configured signals (SIGINT, SIGTERM, SIGUSR*)
//! - Translate each delivery into a call on the shutdown entry point
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Every delivery is forwarded; the sequencer's latch drops duplicates
//! - Non-unix targets only support Ctrl+C, reported as SIGINT

use std::io;
use std::sync::Arc;

use crate::config::ShutdownSignal;
use crate::lifecycle::shutdown::{ShutdownSequencer, ShutdownTrigger};

#[cfg(unix)]
use tokio::signal::unix::{signal, Signal, SignalKind};

#[cfg(unix)]
pub fn signal_kind(signal: ShutdownSignal) -> SignalKind {
    match signal {
        ShutdownSignal::Sigint => SignalKind::interrupt(),
        ShutdownSignal::Sigterm => SignalKind::terminate(),
        ShutdownSignal::Sigusr1 => SignalKind::user_defined1(),
        ShutdownSignal::Sigusr2 => SignalKind::user_defined2(),
    }
}

/// Receives the configured shutdown signals.
pub struct SignalListener {
    #[cfg(unix)]
    streams: Vec<(ShutdownSignal, Signal)>,
}

impl SignalListener {
    /// Install handlers for each distinct signal in `signals`.
    #[cfg(unix)]
    pub fn install(signals: &[ShutdownSignal]) -> io::Result<Self> {
        let mut streams: Vec<(ShutdownSignal, Signal)> = Vec::with_capacity(signals.len());
        for &sig in signals {
            if streams.iter().any(|(s, _)| *s == sig) {
                continue;
            }
            streams.push((sig, signal(signal_kind(sig))?));
        }
        Ok(Self { streams })
    }

    #[cfg(not(unix))]
    pub fn install(_signals: &[ShutdownSignal]) -> io::Result<Self> {
        Ok(Self {})
    }

    /// Signals this listener is subscribed to.
    #[cfg(unix)]
    pub fn signals(&self) -> Vec<ShutdownSignal> {
        self.streams.iter().map(|(s, _)| *s).collect()
    }

    #[cfg(not(unix))]
    pub fn signals(&self) -> Vec<ShutdownSignal> {
        vec![ShutdownSignal::Sigint]
    }

    /// Wait for the next signal delivery.
    #[cfg(unix)]
    pub async fn recv(&mut self) -> Option<ShutdownSignal> {
        use std::task::Poll;

        if self.streams.is_empty() {
            return None;
        }

        std::future::poll_fn(|cx| {
            for (sig, stream) in self.streams.iter_mut() {
                if let Poll::Ready(Some(())) = stream.poll_recv(cx) {
                    return Poll::Ready(Some(*sig));
                }
            }
            Poll::Pending
        })
        .await
    }

    #[cfg(not(unix))]
    pub async fn recv(&mut self) -> Option<ShutdownSignal> {
        match tokio::signal::ctrl_c().await {
            Ok(()) => Some(ShutdownSignal::Sigint),
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                None
            }
        }
    }
}

/// Forward every received signal to the sequencer.
///
/// Each delivery is handled on its own task so a second signal reaches the
/// sequencer while the first shutdown is still running (and is ignored there).
pub async fn listen(
    sequencer: Arc<ShutdownSequencer>,
    signals: &[ShutdownSignal],
    exit_code: i32,
) -> io::Result<()> {
    let mut listener = SignalListener::install(signals)?;
    tracing::info!(signals = ?listener.signals(), "Waiting for shutdown signal");

    while let Some(signal) = listener.recv().await {
        let sequencer = sequencer.clone();
        tokio::spawn(async move {
            sequencer
                .request_shutdown(ShutdownTrigger::Signal(signal), exit_code)
                .await;
        });
    }

    Ok(())
}
