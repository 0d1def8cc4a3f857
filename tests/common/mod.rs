//! Shared utilities for integration testing.
#![allow(dead_code)]

use std::io;
use std::sync::{Arc, Mutex};

use graceful_close::lifecycle::ProcessExit;
use tracing::subscriber::DefaultGuard;

/// In-memory sink for formatted log lines.
#[derive(Clone, Default)]
pub struct CapturedLogs {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    /// Route this thread's tracing events into the buffer.
    ///
    /// `#[tokio::test]` uses a current-thread runtime, so spawned tasks log
    /// through the same subscriber.
    pub fn install(&self) -> DefaultGuard {
        let writer = self.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .without_time()
            .with_target(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn lines(&self) -> Vec<String> {
        let buf = self.buf.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_owned)
            .collect()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Index of the first line containing every needle.
pub fn position(lines: &[String], needles: &[&str]) -> Option<usize> {
    lines
        .iter()
        .position(|line| needles.iter().all(|n| line.contains(n)))
}

/// Number of lines containing every needle.
pub fn count(lines: &[String], needles: &[&str]) -> usize {
    lines
        .iter()
        .filter(|line| needles.iter().all(|n| line.contains(n)))
        .count()
}

/// A call to `ProcessExit::exit`, with the log as it was at that moment.
#[derive(Debug, Clone)]
pub struct ExitRecord {
    pub code: i32,
    pub logs_at_exit: Vec<String>,
}

/// Records exit calls instead of terminating the test process.
pub struct RecordingExit {
    logs: CapturedLogs,
    exits: Mutex<Vec<ExitRecord>>,
}

impl RecordingExit {
    pub fn new(logs: CapturedLogs) -> Arc<Self> {
        Arc::new(Self {
            logs,
            exits: Mutex::new(Vec::new()),
        })
    }

    pub fn exits(&self) -> Vec<ExitRecord> {
        self.exits.lock().unwrap().clone()
    }
}

impl ProcessExit for RecordingExit {
    fn exit(&self, code: i32) {
        let logs_at_exit = self.logs.lines();
        self.exits.lock().unwrap().push(ExitRecord { code, logs_at_exit });
    }
}
