//! Serial session: one connection, one background receive thread.
//!
//! ```text
//! caller ──send()──> writer handle ──> device
//!                                        │
//! log sink <──"Received: .."── rx thread <┘ (reader handle, blocking reads with timeout)
//! ```
//!
//! The receive thread is bound to the connection. It polls a stop flag after
//! every read, so `disconnect` returns within one read timeout even while a
//! read is in flight. A read error ends the thread and the session treats the
//! link as gone: `state()` reports `Disconnected` and the dead connection is
//! cleaned up by the next operation.

use crate::format::{format_bytes, DisplayFormat};
use crate::log_sink::{LogSink, SharedSink};
use crate::port::{
    LineReader, PortConfiguration, PortError, PortOpener, SerialPortAdapter, SystemPortOpener,
    DEFAULT_READ_TIMEOUT,
};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Failure to establish a connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// A live connection exists; it must be closed first.
    #[error("Already connected to {0}. Disconnect first.")]
    AlreadyConnected(String),

    /// The transport could not be opened.
    #[error(transparent)]
    Open(#[from] PortError),
}

/// Failure to send a command byte.
#[derive(Debug, Error)]
pub enum SendError {
    /// No connection is open. Nothing was written.
    #[error("Serial port not open.")]
    NotConnected,

    /// The write itself failed.
    #[error(transparent)]
    Transport(#[from] PortError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Owns zero or one open connection plus its receive thread.
pub struct SerialSession {
    opener: Arc<dyn PortOpener>,
    sink: SharedSink,
    format: Arc<RwLock<DisplayFormat>>,
    read_timeout: Duration,
    connection: Option<Connection>,
}

struct Connection {
    writer: Box<dyn SerialPortAdapter>,
    port_name: String,
    baud_rate: u32,
    receiver: ReceiveTask,
}

impl SerialSession {
    pub fn new(opener: Arc<dyn PortOpener>, sink: SharedSink) -> Self {
        Self {
            opener,
            sink,
            format: Arc::new(RwLock::new(DisplayFormat::default())),
            read_timeout: DEFAULT_READ_TIMEOUT,
            connection: None,
        }
    }

    /// A session that opens real ports.
    pub fn system(sink: SharedSink) -> Self {
        Self::new(Arc::new(SystemPortOpener), sink)
    }

    pub fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn with_format(self, format: DisplayFormat) -> Self {
        self.set_display_format(format);
        self
    }

    /// Change how sent and received bytes are rendered. Applies to the
    /// receive thread from its next line on.
    pub fn set_display_format(&self, format: DisplayFormat) {
        *self.format.write() = format;
    }

    pub fn display_format(&self) -> DisplayFormat {
        *self.format.read()
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn state(&self) -> ConnectionState {
        match &self.connection {
            Some(conn) if conn.receiver.is_alive() => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Name and baud rate of the live connection, if any.
    pub fn connection_info(&self) -> Option<(&str, u32)> {
        self.connection
            .as_ref()
            .filter(|conn| conn.receiver.is_alive())
            .map(|conn| (conn.port_name.as_str(), conn.baud_rate))
    }

    /// Open `port_name` and start the receive thread.
    ///
    /// No retry is attempted; on failure the session stays disconnected.
    pub fn connect(&mut self, port_name: &str, baud_rate: u32) -> Result<(), ConnectionError> {
        self.reap_dead_connection();
        if let Some(conn) = &self.connection {
            return Err(ConnectionError::AlreadyConnected(conn.port_name.clone()));
        }
        if baud_rate == 0 {
            return Err(PortError::config("baud rate must be greater than zero").into());
        }

        let config = PortConfiguration::new(baud_rate).with_timeout(self.read_timeout);
        let writer = self.opener.open(port_name, &config)?;
        let reader = writer.try_clone_port()?;
        let receiver = ReceiveTask::spawn(
            LineReader::new(reader),
            Arc::clone(&self.sink),
            Arc::clone(&self.format),
        )?;

        info!(port = port_name, baud_rate, "serial port connected");
        self.sink
            .append(&format!("Connected to {port_name} at {baud_rate} baud."));
        self.connection = Some(Connection {
            writer,
            port_name: port_name.to_string(),
            baud_rate,
            receiver,
        });
        Ok(())
    }

    /// Close the connection and stop the receive thread.
    ///
    /// Returns `false` (and does nothing) when already disconnected.
    pub fn disconnect(&mut self) -> bool {
        self.reap_dead_connection();
        let Some(conn) = self.connection.take() else {
            return false;
        };
        let port_name = conn.port_name.clone();
        conn.close();
        info!(port = %port_name, "serial port disconnected");
        self.sink.append("Disconnected.");
        true
    }

    /// Write `value` followed by `terminator` in a single write.
    ///
    /// Returns the number of bytes written.
    pub fn send(&mut self, value: u8, terminator: &[u8]) -> Result<usize, SendError> {
        self.reap_dead_connection();
        let conn = self.connection.as_mut().ok_or(SendError::NotConnected)?;

        let mut frame = Vec::with_capacity(1 + terminator.len());
        frame.push(value);
        frame.extend_from_slice(terminator);

        let written = conn.writer.write_bytes(&frame)?;
        debug!(port = %conn.port_name, bytes = written, "command sent");
        self.sink.append(&format!(
            "Sent: {}",
            format_bytes(&frame, self.display_format())
        ));
        Ok(written)
    }

    /// Drop a connection whose receive thread died on a read error.
    fn reap_dead_connection(&mut self) {
        if let Some(conn) = &self.connection {
            if !conn.receiver.is_alive() {
                info!(port = %conn.port_name, "cleaning up lost connection");
                if let Some(conn) = self.connection.take() {
                    conn.close();
                }
            }
        }
    }
}

impl Drop for SerialSession {
    fn drop(&mut self) {
        if let Some(conn) = self.connection.take() {
            conn.close();
        }
    }
}

impl std::fmt::Debug for SerialSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialSession")
            .field("state", &self.state())
            .field("port", &self.connection.as_ref().map(|c| &c.port_name))
            .field("format", &self.display_format())
            .finish()
    }
}

impl Connection {
    fn close(self) {
        let Connection {
            writer,
            mut receiver,
            ..
        } = self;
        receiver.request_stop();
        drop(writer);
        receiver.join();
    }
}

/// The background reader.
struct ReceiveTask {
    stop: Arc<AtomicBool>,
    alive: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ReceiveTask {
    fn spawn(
        reader: LineReader,
        sink: SharedSink,
        format: Arc<RwLock<DisplayFormat>>,
    ) -> Result<Self, PortError> {
        let stop = Arc::new(AtomicBool::new(false));
        let alive = Arc::new(AtomicBool::new(true));

        let thread_stop = Arc::clone(&stop);
        let thread_alive = Arc::clone(&alive);
        let handle = thread::Builder::new()
            .name(format!("serial-rx-{}", reader.port_name()))
            .spawn(move || {
                receive_loop(reader, &thread_stop, sink.as_ref(), &format);
                thread_alive.store(false, Ordering::Release);
            })?;

        Ok(Self {
            stop,
            alive,
            handle: Some(handle),
        })
    }

    fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("receive thread panicked");
            }
        }
    }
}

impl Drop for ReceiveTask {
    fn drop(&mut self) {
        self.request_stop();
        self.join();
    }
}

fn receive_loop(
    mut reader: LineReader,
    stop: &AtomicBool,
    sink: &dyn LogSink,
    format: &RwLock<DisplayFormat>,
) {
    debug!(port = reader.port_name(), "receive thread started");
    while !stop.load(Ordering::Acquire) {
        match reader.read_line() {
            Ok(line) if line.is_empty() => {}
            Ok(line) => {
                let mode = *format.read();
                sink.append(&format!("Received: {}", format_bytes(&line, mode)));
            }
            Err(e) => {
                if !stop.load(Ordering::Acquire) {
                    warn!(port = reader.port_name(), error = %e, "serial read failed");
                    sink.append(&format!("Receive error: {e}"));
                    sink.append("Connection lost.");
                }
                break;
            }
        }
    }
    debug!(port = reader.port_name(), "receive thread stopped");
}
