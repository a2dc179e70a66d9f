//! Port abstraction layer for serial communication.
//!
//! Provides the transport trait, the `serialport`-backed implementation, a
//! mock for tests and the line reader used by the receive loop.

pub mod error;
pub mod line_reader;
pub mod mock;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use line_reader::LineReader;
pub use mock::{MockPortOpener, MockSerialPort};
pub use sync_port::{list_ports, PortInfo, SyncSerialPort, SystemPortOpener};
pub use traits::*;
