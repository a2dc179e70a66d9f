//! Mock serial port implementation for testing.
//!
//! `MockSerialPort` simulates a device without hardware: bytes queued with
//! [`MockSerialPort::enqueue_read`] are returned by reads, writes are logged,
//! and reads on an empty queue block for the configured timeout exactly like
//! a real port would. All clones share one state, so a test can keep a handle
//! while the session owns others.

use super::error::PortError;
use super::traits::{PortConfiguration, PortOpener, SerialPortAdapter};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Inner state of the mock port.
#[derive(Debug, Default)]
struct MockPortState {
    /// Queue of bytes to be returned by read operations.
    read_queue: VecDeque<u8>,
    /// Log of all bytes written to the port, one entry per write call.
    write_log: Vec<Vec<u8>>,
    /// Error message returned by the next write, if set.
    fail_next_write: Option<String>,
    /// Error message returned by every read once the queue is drained.
    fail_reads: Option<String>,
    /// Set by `close`; reads and writes then fail with `NotOpen`.
    closed: bool,
    /// Configured read timeout.
    timeout: Duration,
}

#[derive(Debug, Default)]
struct Shared {
    state: Mutex<MockPortState>,
    /// Signalled whenever data is queued, a failure is injected or the port closes.
    changed: Condvar,
}

/// Mock serial port implementation for testing.
///
/// # Example
/// ```
/// use serial_cmd_sender::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(b"OK\r\n");
///
/// let mut buffer = [0u8; 8];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"OK\r\n");
///
/// port.write_bytes(&[0x01, 0x0D]).unwrap();
/// assert_eq!(port.get_write_log(), vec![vec![0x01, 0x0D]]);
/// ```
#[derive(Clone)]
pub struct MockSerialPort {
    name: String,
    shared: Arc<Shared>,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name and a 1 s read timeout.
    pub fn new(name: impl Into<String>) -> Self {
        let port = Self {
            name: name.into(),
            shared: Arc::new(Shared::default()),
        };
        port.shared.state.lock().timeout = Duration::from_secs(1);
        port
    }

    /// Enqueue bytes to be returned by subsequent read operations.
    pub fn enqueue_read(&self, data: &[u8]) {
        let mut state = self.shared.state.lock();
        state.read_queue.extend(data);
        self.shared.changed.notify_all();
    }

    /// Get a copy of all data written to the port.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.shared.state.lock().write_log.clone()
    }

    /// Make the next write fail with an I/O error carrying `message`.
    pub fn fail_next_write(&self, message: impl Into<String>) {
        self.shared.state.lock().fail_next_write = Some(message.into());
    }

    /// Make reads fail with an I/O error once the queued data is drained.
    pub fn fail_reads(&self, message: impl Into<String>) {
        let mut state = self.shared.state.lock();
        state.fail_reads = Some(message.into());
        self.shared.changed.notify_all();
    }

    /// Set the read timeout.
    pub fn set_timeout(&self, timeout: Duration) {
        self.shared.state.lock().timeout = timeout;
    }

    /// Simulate the device going away. Pending and future reads fail.
    pub fn close(&self) {
        let mut state = self.shared.state.lock();
        state.closed = true;
        self.shared.changed.notify_all();
    }

    /// Whether `close` has been called since the last (re)open.
    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Get the number of bytes available to read.
    pub fn available_bytes(&self) -> usize {
        self.shared.state.lock().read_queue.len()
    }

    fn reopen(&self, port_name: &str, config: &PortConfiguration) -> Self {
        let mut state = self.shared.state.lock();
        state.closed = false;
        state.timeout = config.timeout;
        drop(state);
        Self {
            name: port_name.to_string(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let mut state = self.shared.state.lock();
        if state.closed {
            return Err(PortError::NotOpen);
        }
        if let Some(message) = state.fail_next_write.take() {
            return Err(PortError::Io(std::io::Error::other(message)));
        }
        state.write_log.push(data.to_vec());
        Ok(data.len())
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.shared.state.lock();
        let deadline = Instant::now() + state.timeout;

        loop {
            if state.closed {
                return Err(PortError::NotOpen);
            }
            if !state.read_queue.is_empty() {
                let n = buffer.len().min(state.read_queue.len());
                for (slot, byte) in buffer.iter_mut().zip(state.read_queue.drain(..n)) {
                    *slot = byte;
                }
                return Ok(n);
            }
            if let Some(message) = &state.fail_reads {
                return Err(PortError::Io(std::io::Error::other(message.clone())));
            }
            if self
                .shared
                .changed
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                return Err(PortError::timeout(state.timeout));
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn try_clone_port(&self) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        Ok(Box::new(self.clone()))
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

/// A [`PortOpener`] that hands out handles to one shared [`MockSerialPort`].
#[derive(Debug, Clone)]
pub struct MockPortOpener {
    port: MockSerialPort,
    fail_open: Arc<Mutex<Option<String>>>,
    opened: Arc<Mutex<Vec<(String, PortConfiguration)>>>,
}

impl MockPortOpener {
    pub fn new(port: MockSerialPort) -> Self {
        Self {
            port,
            fail_open: Arc::new(Mutex::new(None)),
            opened: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// The shared mock port behind every handle this opener returns.
    pub fn port(&self) -> &MockSerialPort {
        &self.port
    }

    /// Make every subsequent `open` fail with `NotFound`, or succeed again with `None`.
    pub fn set_fail_open(&self, message: Option<&str>) {
        *self.fail_open.lock() = message.map(str::to_string);
    }

    /// Every successful open as `(port name, configuration)`.
    pub fn opened(&self) -> Vec<(String, PortConfiguration)> {
        self.opened.lock().clone()
    }
}

impl PortOpener for MockPortOpener {
    fn open(
        &self,
        port_name: &str,
        config: &PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        if let Some(message) = self.fail_open.lock().as_deref() {
            return Err(PortError::not_found(format!("{port_name} ({message})")));
        }
        self.opened
            .lock()
            .push((port_name.to_string(), config.clone()));
        Ok(Box::new(self.port.reopen(port_name, config)))
    }
}
