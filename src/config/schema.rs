//! Configuration schema definitions.
//!
//! This module defines the structure of the configuration file using serde.
//! Every section has defaults, so an empty file (or no file) is valid.

use super::error::{ConfigError, ConfigResult};
use crate::format::DisplayFormat;
use crate::terminator::EndChar;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial port configuration
    pub serial: SerialConfig,
    /// Where to look for the definitions file
    pub definitions: DefinitionsConfig,
    /// Diagnostic logging and operator log output
    pub logging: LoggingConfig,
}

impl Config {
    /// Reject values that would make the program unusable.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.serial.default_baud == 0 {
            return Err(ConfigError::validation(
                "serial.default_baud",
                "must be greater than zero",
            ));
        }
        if self.serial.baud_rates.contains(&0) {
            return Err(ConfigError::validation(
                "serial.baud_rates",
                "must not contain zero",
            ));
        }
        if self.serial.read_timeout_ms == 0 {
            return Err(ConfigError::validation(
                "serial.read_timeout_ms",
                "must be greater than zero",
            ));
        }
        if self.definitions.suffix.is_empty() {
            return Err(ConfigError::validation(
                "definitions.suffix",
                "must not be empty",
            ));
        }
        Ok(())
    }
}

/// Serial port configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Port used when none is given on the command line
    pub default_port: Option<String>,
    /// Default baud rate for new connections
    pub default_baud: u32,
    /// Baud rates offered to the operator
    pub baud_rates: Vec<u32>,
    /// Read timeout of the receive thread, in milliseconds
    pub read_timeout_ms: u64,
    /// Terminator appended after each command byte
    pub end_char: EndChar,
    /// How sent and received bytes are shown
    pub display_format: DisplayFormat,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            default_port: None,
            default_baud: 9600,
            baud_rates: vec![9600, 19200, 38400, 57600, 115200],
            read_timeout_ms: 1000,
            end_char: EndChar::Cr,
            display_format: DisplayFormat::HexAscii,
        }
    }
}

impl SerialConfig {
    /// Get the read timeout as Duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Definitions file lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefinitionsConfig {
    /// Directory searched for the definitions file
    pub dir: PathBuf,
    /// File name suffix that marks a definitions file
    pub suffix: String,
}

impl Default for DefinitionsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            suffix: crate::commands::DEFAULT_SUFFIX.to_string(),
        }
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Diagnostic level: "trace", "debug", "info", "warn", "error"
    pub level: String,
    /// Diagnostic output format
    pub format: LogFormat,
    /// Prefix operator log lines with the local time
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            timestamps: false,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line format with source locations
    Pretty,
    /// Single-line format
    #[default]
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.serial.default_baud, 9600);
        assert_eq!(config.serial.read_timeout(), Duration::from_secs(1));
        assert_eq!(config.serial.end_char, EndChar::Cr);
        assert_eq!(config.serial.display_format, DisplayFormat::HexAscii);
        assert_eq!(config.definitions.suffix, "_commands.h");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[serial]"));
        assert!(toml_str.contains("end_char = \"cr\""));
        assert!(toml_str.contains("display_format = \"hex-ascii\""));
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [serial]
            default_port = "/dev/ttyUSB0"
            default_baud = 115200
            end_char = "cr-lf"
            display_format = "dec"

            [logging]
            format = "pretty"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.serial.default_port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.serial.default_baud, 115200);
        assert_eq!(config.serial.end_char, EndChar::CrLf);
        assert_eq!(config.serial.display_format, DisplayFormat::Dec);
        assert_eq!(config.logging.format, LogFormat::Pretty);
        // Untouched sections keep their defaults.
        assert_eq!(config.definitions, DefinitionsConfig::default());
    }

    #[test]
    fn test_enum_values_accept_console_spellings() {
        let config: Config = toml::from_str(
            r#"
            [serial]
            end_char = "cr+lf"
            display_format = "hex+ascii"
        "#,
        )
        .unwrap();
        assert_eq!(config.serial.end_char, EndChar::CrLf);
        assert_eq!(config.serial.display_format, DisplayFormat::HexAscii);

        let config: Config =
            toml::from_str("[serial]\nend_char = \"CR + LF\"\ndisplay_format = \"HEX + ASCII\"")
                .unwrap();
        assert_eq!(config.serial.end_char, EndChar::CrLf);
        assert_eq!(config.serial.display_format, DisplayFormat::HexAscii);

        let err = toml::from_str::<Config>("[serial]\nend_char = \"tab\"").unwrap_err();
        assert!(err.to_string().contains("unknown end character"));
    }

    #[test]
    fn test_validation_rejects_zero_values() {
        let mut config = Config::default();
        config.serial.read_timeout_ms = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("serial.read_timeout_ms"));

        let mut config = Config::default();
        config.definitions.suffix.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.serial.baud_rates.push(0);
        assert!(config.validate().is_err());
    }
}
