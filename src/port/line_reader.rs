//! Line-oriented reads on top of [`SerialPortAdapter`].

use super::error::PortError;
use super::traits::SerialPortAdapter;
use memchr::memchr;

const CHUNK_SIZE: usize = 256;

/// Longest line handed out before a `\n` is seen.
pub const MAX_LINE_LEN: usize = 4096;

/// Buffers port reads and splits them at `\n`.
///
/// `read_line` behaves like a classic serial `readline`: it returns one line
/// including its terminating `\n`, or, when the read timeout expires first,
/// whatever arrived so far (possibly nothing).
#[derive(Debug)]
pub struct LineReader {
    port: Box<dyn SerialPortAdapter>,
    pending: Vec<u8>,
    chunk: Vec<u8>,
}

impl LineReader {
    pub fn new(port: Box<dyn SerialPortAdapter>) -> Self {
        Self {
            port,
            pending: Vec::new(),
            chunk: vec![0u8; CHUNK_SIZE],
        }
    }

    pub fn port_name(&self) -> &str {
        self.port.name()
    }

    /// Read one line. An empty result means the timeout expired with no data.
    pub fn read_line(&mut self) -> Result<Vec<u8>, PortError> {
        loop {
            if let Some(pos) = memchr(b'\n', &self.pending) {
                let rest = self.pending.split_off(pos + 1);
                return Ok(std::mem::replace(&mut self.pending, rest));
            }
            if self.pending.len() >= MAX_LINE_LEN {
                return Ok(std::mem::take(&mut self.pending));
            }

            match self.port.read_bytes(&mut self.chunk) {
                Ok(0) => return Ok(std::mem::take(&mut self.pending)),
                Ok(n) => self.pending.extend_from_slice(&self.chunk[..n]),
                Err(e) if e.is_timeout() => return Ok(std::mem::take(&mut self.pending)),
                Err(e) => return Err(e),
            }
        }
    }
}
