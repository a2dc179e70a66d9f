use crate::commands::CommandsError;
use crate::config::ConfigError;
use crate::console::ConsoleError;
use crate::port::PortError;
use crate::session::{ConnectionError, SendError};
use std::fmt;

/// Convenience alias for fallible operations at the binary boundary.
pub type AppResult<T> = Result<T, AppError>;

/// Unified application error type.
///
/// Each library layer has its own error enum; this one only gathers them for
/// the binary so every failure ends up as one message and one exit code.
#[derive(Debug)]
pub enum AppError {
    Definitions(CommandsError),
    Config(ConfigError),
    Connection(ConnectionError),
    Send(SendError),
    Port(PortError),
    Console(ConsoleError),
    /// No port on the command line and none configured.
    NoPort,
    IoError(std::io::Error),
    SerdeError(serde_json::Error),
}

impl AppError {
    /// Process exit code for this failure. Every fatal error, a missing
    /// definitions file included, exits with 1.
    pub fn exit_code(&self) -> u8 {
        1
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Definitions(e) => write!(f, "{e}"),
            Self::Config(e) => write!(f, "{e}"),
            Self::Connection(e) => write!(f, "Connection error: {e}"),
            Self::Send(e) => write!(f, "Send error: {e}"),
            Self::Port(e) => write!(f, "{e}"),
            Self::Console(e) => write!(f, "{e}"),
            Self::NoPort => write!(
                f,
                "No serial port given. Pass --port or set serial.default_port in the configuration."
            ),
            Self::IoError(e) => write!(f, "An I/O error occurred: {e}"),
            Self::SerdeError(e) => write!(f, "A serialization error occurred: {e}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Definitions(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::Connection(e) => Some(e),
            Self::Send(e) => Some(e),
            Self::Port(e) => Some(e),
            Self::Console(e) => Some(e),
            Self::NoPort => None,
            Self::IoError(e) => Some(e),
            Self::SerdeError(e) => Some(e),
        }
    }
}

// Implement `From` conversions to allow the `?` operator to work seamlessly.
impl From<CommandsError> for AppError {
    fn from(err: CommandsError) -> Self {
        AppError::Definitions(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<ConnectionError> for AppError {
    fn from(err: ConnectionError) -> Self {
        AppError::Connection(err)
    }
}

impl From<SendError> for AppError {
    fn from(err: SendError) -> Self {
        AppError::Send(err)
    }
}

impl From<PortError> for AppError {
    fn from(err: PortError) -> Self {
        AppError::Port(err)
    }
}

impl From<ConsoleError> for AppError {
    fn from(err: ConsoleError) -> Self {
        AppError::Console(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerdeError(err)
    }
}
