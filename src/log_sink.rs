//! Operator-facing log output.
//!
//! This is the append-only text surface the operator watches (sent and
//! received lines, connection events). Diagnostics go through `tracing`
//! instead. Sinks are shared between the caller and the receive thread, so
//! every implementation serializes its appends.

use parking_lot::{Condvar, Mutex};
use std::io::Write;
use std::sync::Arc;
use std::time::{Duration, Instant};

pub trait LogSink: Send + Sync {
    /// Append one complete line (without trailing newline).
    fn append(&self, line: &str);
}

pub type SharedSink = Arc<dyn LogSink>;

/// Writes lines to stdout, optionally prefixed with a local timestamp.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink {
    timestamps: bool,
}

impl StdoutSink {
    pub fn new(timestamps: bool) -> Self {
        Self { timestamps }
    }
}

impl LogSink for StdoutSink {
    fn append(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        // A closed stdout leaves nothing useful to report to.
        let _ = if self.timestamps {
            writeln!(out, "[{}] {}", chrono::Local::now().format("%H:%M:%S%.3f"), line)
        } else {
            writeln!(out, "{line}")
        };
        let _ = out.flush();
    }
}

/// Keeps lines in memory. Used by tests and by embedders that render the log
/// themselves.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
    appended: Condvar,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|l| l.contains(needle))
    }

    /// Block until some line contains `needle`, or `timeout` passes.
    pub fn wait_for(&self, needle: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut lines = self.lines.lock();
        loop {
            if lines.iter().any(|l| l.contains(needle)) {
                return true;
            }
            if self.appended.wait_until(&mut lines, deadline).timed_out() {
                return lines.iter().any(|l| l.contains(needle));
            }
        }
    }
}

impl LogSink for MemorySink {
    fn append(&self, line: &str) {
        self.lines.lock().push(line.to_string());
        self.appended.notify_all();
    }
}
