//! Configuration module for sqlgraph.
//!
//! Handles compiler and logging settings loaded from TOML.

mod settings;

pub use settings::{
    init_logging, CompilerSettings, LoggingSettings, Settings, SettingsError, CONFIG_ENV_VAR,
};
