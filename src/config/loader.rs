//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "SERIAL_CMD";

/// Config file name in the working directory
const LOCAL_CONFIG_FILE_NAME: &str = "serial-cmd.toml";

/// Config file name inside the platform config directory
const CONFIG_FILE_NAME: &str = "config.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "SERIAL_CMD_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `SERIAL_CMD_CONFIG` environment variable (explicit path)
    /// 2. `./serial-cmd.toml` (current directory)
    /// 3. `config.toml` in the platform config directory
    ///    (`~/.config/serial-cmd` on Linux, `%APPDATA%\serial-cmd\config` on Windows)
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables override file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = match &config_path {
            Some(path) => load_from_file(path)?,
            None => Config::default(),
        };

        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Load configuration from a specific file path. The file must exist.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(ConfigError::NotFound(path));
        }
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        config.validate()?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Env overrides still apply; invalid ones are ignored here.
        if apply_env_overrides(&mut config).is_err() || config.validate().is_err() {
            config = Config::default();
        }

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
        debug!(path = %path.display(), "{CONFIG_PATH_ENV} points to a missing file");
    }

    let cwd_config = PathBuf::from(LOCAL_CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    get_default_config_path().filter(|path| path.exists())
}

/// Get the platform-specific config directory for this application.
pub fn get_default_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "serial-cmd").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the default config file path.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

/// Load configuration from a file.
fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(path = %path.display(), "loading configuration");

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Read `SERIAL_CMD_<key>` and parse it, if set.
fn env_value<T: FromStr>(key: &str) -> ConfigResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    let var = format!("{ENV_PREFIX}_{key}");
    match std::env::var(&var) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::env_parse(var, e.to_string())),
        Err(_) => Ok(None),
    }
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern `SERIAL_CMD_<SECTION>_<KEY>`,
/// for example `SERIAL_CMD_SERIAL_DEFAULT_BAUD=115200`.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    // Serial overrides
    if let Some(val) = env_value::<String>("SERIAL_DEFAULT_PORT")? {
        config.serial.default_port = (!val.is_empty()).then_some(val);
    }
    if let Some(val) = env_value("SERIAL_DEFAULT_BAUD")? {
        config.serial.default_baud = val;
    }
    if let Some(val) = env_value("SERIAL_READ_TIMEOUT_MS")? {
        config.serial.read_timeout_ms = val;
    }
    if let Some(val) = env_value("SERIAL_END_CHAR")? {
        config.serial.end_char = val;
    }
    if let Some(val) = env_value("SERIAL_DISPLAY_FORMAT")? {
        config.serial.display_format = val;
    }

    // Definitions overrides
    if let Some(val) = env_value::<String>("DEFINITIONS_DIR")? {
        config.definitions.dir = PathBuf::from(val);
    }

    // Logging overrides
    if let Some(val) = env_value("LOGGING_LEVEL")? {
        config.logging.level = val;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::DisplayFormat;
    use crate::terminator::EndChar;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().serial.default_baud, 9600);
        assert!(loader.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("SERIAL_CMD_SERIAL_DEFAULT_BAUD", "57600");
        env::set_var("SERIAL_CMD_SERIAL_END_CHAR", "CR + LF");
        env::set_var("SERIAL_CMD_SERIAL_DISPLAY_FORMAT", "hex");

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().serial.default_baud, 57600);
        assert_eq!(loader.config().serial.end_char, EndChar::CrLf);
        assert_eq!(loader.config().serial.display_format, DisplayFormat::Hex);

        env::remove_var("SERIAL_CMD_SERIAL_DEFAULT_BAUD");
        env::remove_var("SERIAL_CMD_SERIAL_END_CHAR");
        env::remove_var("SERIAL_CMD_SERIAL_DISPLAY_FORMAT");
    }

    #[test]
    #[serial]
    fn test_invalid_env_value() {
        let file = tempfile::NamedTempFile::new().unwrap();
        env::set_var("SERIAL_CMD_SERIAL_DEFAULT_BAUD", "fast");

        let err = ConfigLoader::load_from(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EnvParseError { ref var, .. } if var == "SERIAL_CMD_SERIAL_DEFAULT_BAUD"
        ));
        // Defaults-only loading shrugs it off.
        assert_eq!(ConfigLoader::with_defaults().config().serial.default_baud, 9600);

        env::remove_var("SERIAL_CMD_SERIAL_DEFAULT_BAUD");
    }

    #[test]
    #[serial]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            b"[serial]\ndefault_port = \"COM3\"\nread_timeout_ms = 250\n\n[definitions]\ndir = \"defs\"\n",
        )
        .unwrap();

        let loader = ConfigLoader::load_from(file.path()).unwrap();
        let config = loader.config();
        assert_eq!(config.serial.default_port.as_deref(), Some("COM3"));
        assert_eq!(config.serial.read_timeout_ms, 250);
        assert_eq!(config.definitions.dir, PathBuf::from("defs"));
        assert_eq!(loader.config_path.as_deref(), Some(file.path()));
    }

    #[test]
    #[serial]
    fn test_load_from_missing_and_invalid_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            ConfigLoader::load_from(&missing),
            Err(ConfigError::NotFound(_))
        ));

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[serial]\ndefault_baud = \"many\"\n").unwrap();
        assert!(matches!(
            ConfigLoader::load_from(&bad),
            Err(ConfigError::ParseError(_))
        ));

        let zero = dir.path().join("zero.toml");
        std::fs::write(&zero, "[serial]\nread_timeout_ms = 0\n").unwrap();
        assert!(matches!(
            ConfigLoader::load_from(&zero),
            Err(ConfigError::ValidationError { .. })
        ));
    }

    #[test]
    #[serial]
    fn test_explicit_config_env_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"[logging]\nlevel = \"debug\"\n").unwrap();
        env::set_var("SERIAL_CMD_CONFIG", file.path());

        let loader = ConfigLoader::load().unwrap();
        assert_eq!(loader.config().logging.level, "debug");
        assert_eq!(loader.config_path.as_deref(), Some(file.path()));

        env::remove_var("SERIAL_CMD_CONFIG");
    }
}
