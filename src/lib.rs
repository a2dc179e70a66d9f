//! Serial command sender library.
//!
//! Reads a `*_commands.h` definitions file into a table of named command
//! bytes, sends those bytes over a serial port with a selectable line
//! terminator, and shows what the device answers.
//!
//! # Modules
//!
//! - `commands`: definitions file discovery, parsing and the command table
//! - `port`: port abstraction layer (real, mock, line reader)
//! - `session`: one connection plus its background receive thread
//! - `format`: byte rendering (ASCII, HEX, HEX + ASCII, DEC)
//! - `terminator`: line terminators appended after each command byte
//! - `log_sink`: operator-facing log output
//! - `console`: the interactive console
//! - `config`: configuration management with TOML support
//! - `error`: unified error handling for the binary
//!
//! # Example
//!
//! ```
//! use serial_cmd_sender::commands::parse_str;
//! use serial_cmd_sender::{format_bytes, DisplayFormat, EndChar};
//!
//! let table = parse_str("// Motor Commands\n#define MOTOR_START 0x01\n");
//! let start = table.find("MOTOR_START").unwrap().def;
//!
//! let mut frame = vec![start.byte()];
//! frame.extend_from_slice(EndChar::CrLf.bytes());
//! assert_eq!(format_bytes(&frame, DisplayFormat::Hex), "01 0D 0A");
//! ```

pub mod commands;
pub mod config;
pub mod console;
pub mod error;
pub mod format;
pub mod log_sink;
pub mod port;
pub mod session;
pub mod terminator;

// Re-export commonly used types for convenience
pub use commands::{CommandDef, CommandGroup, CommandTable, CommandsError};
pub use console::{Console, ConsoleError, ConsoleSettings, Flow};
pub use error::{AppError, AppResult};
pub use format::{format_bytes, DisplayFormat};
pub use log_sink::{LogSink, MemorySink, SharedSink, StdoutSink};
pub use port::{MockPortOpener, MockSerialPort, PortConfiguration, PortError, SerialPortAdapter};
pub use session::{ConnectionError, ConnectionState, SendError, SerialSession};
pub use terminator::EndChar;

// Re-export config types
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
