//! Configuration module.
//!
//! TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! Configuration is loaded from the following locations (in order of priority):
//!
//! 1. `SERIAL_CMD_CONFIG` environment variable (explicit path)
//! 2. `./serial-cmd.toml` (current directory)
//! 3. `config.toml` in the platform config directory
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is `SERIAL_CMD_<SECTION>_<KEY>`:
//! - `SERIAL_CMD_SERIAL_DEFAULT_PORT=/dev/ttyUSB0`
//! - `SERIAL_CMD_SERIAL_DEFAULT_BAUD=115200`
//! - `SERIAL_CMD_SERIAL_READ_TIMEOUT_MS=500`
//! - `SERIAL_CMD_SERIAL_END_CHAR=cr+lf`
//! - `SERIAL_CMD_SERIAL_DISPLAY_FORMAT=hex`
//! - `SERIAL_CMD_DEFINITIONS_DIR=./firmware/include`
//! - `SERIAL_CMD_LOGGING_LEVEL=debug`
//!
//! # Example
//!
//! ```rust,no_run
//! use serial_cmd_sender::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let config = loader.config();
//! println!("Default baud: {}", config.serial.default_baud);
//! # Ok::<(), serial_cmd_sender::config::ConfigError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{Config, DefinitionsConfig, LogFormat, LoggingConfig, SerialConfig};
