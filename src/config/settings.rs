//! TOML-based configuration for sqlgraph.
//!
//! Example configuration:
//! ```toml
//! [compiler]
//! name_prefix_length = 28
//! name_separator = "___"
//! pretty = false
//!
//! [logging]
//! filter = "sqlgraph=debug"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "SQLGRAPH_CONFIG";

/// Failure to load or validate a settings file.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("no settings file at {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("cannot read settings: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("malformed settings: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("invalid setting: {0}")]
    InvalidConfig(String),
}

/// All sqlgraph settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// SQL generation settings.
    pub compiler: CompilerSettings,

    /// Logging settings.
    pub logging: LoggingSettings,
}

/// SQL generation settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// Characters of `generic_name` kept in generated names.
    pub name_prefix_length: usize,

    /// Separator between the name prefix and the hash.
    pub name_separator: String,

    /// Put each CTE on its own line.
    pub pretty: bool,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            name_prefix_length: 28,
            name_separator: "___".to_string(),
            pretty: false,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset (env_logger syntax).
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
        }
    }
}

impl Settings {
    /// Read and validate the TOML file at `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        match fs::read_to_string(path.as_ref()) {
            Ok(text) => Self::from_toml_str(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(SettingsError::FileNotFound(path.as_ref().to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Settings from the first file found, or defaults.
    ///
    /// `$SQLGRAPH_CONFIG` (which must exist when set), then `./sqlgraph.toml`,
    /// then `<config dir>/sqlgraph/config.toml`.
    pub fn load() -> Result<Self, SettingsError> {
        if let Some(explicit) = env::var_os(CONFIG_ENV_VAR) {
            return Self::from_file(PathBuf::from(explicit));
        }

        let candidates = [Some(PathBuf::from("sqlgraph.toml")), user_config_path()];
        match candidates.into_iter().flatten().find(|p| p.is_file()) {
            Some(path) => {
                log::debug!("loading settings from {}", path.display());
                Self::from_file(path)
            }
            None => Ok(Settings::default()),
        }
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.compiler.name_prefix_length == 0 {
            return Err(SettingsError::InvalidConfig(
                "compiler.name_prefix_length must be at least 1".to_string(),
            ));
        }
        if self.compiler.name_separator.is_empty() {
            return Err(SettingsError::InvalidConfig(
                "compiler.name_separator must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sqlgraph").join("config.toml"))
}

/// Install an `env_logger` using `RUST_LOG`, falling back to the configured filter.
///
/// Calling it more than once is harmless.
pub fn init_logging(settings: &LoggingSettings) {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(settings.filter.as_str()),
    )
    .try_init();
}
