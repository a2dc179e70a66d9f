//! Core traits for serial port abstraction.
//!
//! `SerialPortAdapter` lets the session run against real hardware or against
//! `MockSerialPort`; `PortOpener` is the seam the session uses to create one.

use super::error::PortError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default read timeout used by the receive loop.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Parameters used to open a serial port (always 8N1, no flow control).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortConfiguration {
    /// Baud rate (bits per second).
    pub baud_rate: u32,

    /// Read timeout. A blocking read returns after this long without data.
    pub timeout: Duration,
}

impl PortConfiguration {
    pub fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for PortConfiguration {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

/// Trait for serial port I/O operations.
///
/// Reads block for at most the configured timeout. An expired timeout is an
/// error for which [`PortError::is_timeout`] returns true.
pub trait SerialPortAdapter: Send + std::fmt::Debug {
    /// Write bytes to the serial port.
    ///
    /// Returns the number of bytes actually written.
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError>;

    /// Read bytes from the serial port into the provided buffer.
    ///
    /// Returns the number of bytes actually read.
    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError>;

    /// Get the name/path of this serial port.
    fn name(&self) -> &str;

    /// Create a second handle to the same port.
    ///
    /// The session writes through the original handle and reads through the
    /// clone on its receive thread.
    fn try_clone_port(&self) -> Result<Box<dyn SerialPortAdapter>, PortError>;
}

/// Opens transports by name. Implemented for real hardware by
/// [`SystemPortOpener`](super::SystemPortOpener) and for tests by
/// [`MockPortOpener`](super::MockPortOpener).
pub trait PortOpener: Send + Sync {
    fn open(
        &self,
        port_name: &str,
        config: &PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError>;
}
