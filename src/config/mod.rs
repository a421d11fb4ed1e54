//! Configuration module for clipcount.
//!
//! Handles the config file, environment variables, and settings.

mod settings;

pub use settings::{
    expand_env_vars, parse_duration, CompilerSettings, DatabaseSettings, LlmSettings, Settings,
    SettingsError, CONFIG_ENV_VAR,
};
