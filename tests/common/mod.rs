//! Shared test utilities.
//!
//! - the demo definitions file under `tests/fixtures`
//! - a session wired to a mock port and an in-memory log

#![allow(dead_code)]

use serial_cmd_sender::{MemorySink, MockPortOpener, MockSerialPort, SerialSession};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Upper bound for waiting on log lines produced by the receive thread.
pub const WAIT: Duration = Duration::from_secs(2);

/// Read timeout used by mock sessions, short so disconnects are quick.
pub const FAST_TIMEOUT: Duration = Duration::from_millis(20);

pub const DEMO_DEFINITIONS: &str = include_str!("../fixtures/my_device_commands.h");

pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("fixtures")
}

/// A session talking to a fresh mock port.
pub struct MockRig {
    pub session: SerialSession,
    pub opener: MockPortOpener,
    pub sink: Arc<MemorySink>,
}

impl MockRig {
    pub fn new() -> Self {
        let opener = MockPortOpener::new(MockSerialPort::new("MOCK0"));
        let sink = Arc::new(MemorySink::new());
        let session = SerialSession::new(Arc::new(opener.clone()), sink.clone())
            .with_read_timeout(FAST_TIMEOUT);
        Self {
            session,
            opener,
            sink,
        }
    }

    pub fn port(&self) -> &MockSerialPort {
        self.opener.port()
    }
}
