//! src/progress.rs
//!
//! Human-readable progress reporting.
//!
//! The engine reports phase headers, chunk layout, per-task activity and pass
//! counts as plain lines through a `ProgressSink`. Work units on pool threads
//! emit lines too, so every sink must be `Send + Sync` and must not block the
//! caller for long.
//!
//! Structured diagnostics go through `tracing` separately. `TracingSink` bridges
//! the two for hosts that only want one channel.

use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

/// Receives progress lines from the engine and its workers.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, line: &str);
}

/// Discards every line.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _line: &str) {}
}

/// Keeps every line in memory, in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines received so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|line| line.contains(needle))
    }

    pub fn clear(&self) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl ProgressSink for MemorySink {
    fn emit(&self, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
    }
}

/// Forwards each line as a `tracing` info event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ProgressSink for TracingSink {
    fn emit(&self, line: &str) {
        tracing::info!(target: "parallel_tasks::progress", "{}", line);
    }
}

/// Writes each line to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl ProgressSink for StdoutSink {
    fn emit(&self, line: &str) {
        // Locking stdout keeps lines from different workers whole
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{}", line);
    }
}
