//! TOML-based configuration for clipcount.
//!
//! Supports a config file (clipcount.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [database]
//! path = "./data/clipcount.db"
//! query_timeout = "30s"
//!
//! [compiler]
//! column_scope = "per_table"  # or "global"
//!
//! [llm]
//! base_url = "https://api.openai.com/v1"
//! model = "gpt-4.1-mini"
//! api_key = "${OPENAI_API_KEY}"
//! temperature = 0.0
//! request_timeout = "60s"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::compile::{ColumnScope, CompileOptions};
use crate::nl::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "CLIPCOUNT_CONFIG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid duration format: {0}")]
    InvalidDuration(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Analytics store.
    pub database: DatabaseSettings,

    /// Specification compiler.
    pub compiler: CompilerSettings,

    /// Language model used by `ask`.
    pub llm: LlmSettings,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Path to the SQLite file (supports ${ENV_VAR} expansion).
    pub path: String,

    /// Per-request deadline (e.g., "30s", "500ms"). "0s" disables it.
    pub query_timeout: String,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: "./data/clipcount.db".to_string(),
            query_timeout: "30s".to_string(),
        }
    }
}

impl DatabaseSettings {
    /// Database path with environment variables expanded.
    pub fn resolved_path(&self) -> Result<PathBuf, SettingsError> {
        Ok(PathBuf::from(expand_env_vars(&self.path)?))
    }

    /// The deadline, or `None` when disabled.
    pub fn timeout(&self) -> Result<Option<Duration>, SettingsError> {
        let d = parse_duration(&self.query_timeout)?;
        Ok((!d.is_zero()).then_some(d))
    }
}

/// Compiler configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// How filter columns are checked against the queried table.
    pub column_scope: ColumnScope,
}

impl CompilerSettings {
    pub fn options(&self) -> CompileOptions {
        CompileOptions::default().with_column_scope(self.column_scope)
    }
}

/// Language model configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmSettings {
    /// OpenAI-compatible API root.
    pub base_url: String,

    /// Chat model name.
    pub model: String,

    /// API key (supports ${ENV_VAR} expansion).
    pub api_key: String,

    /// Sampling temperature, 0.0 to 2.0.
    pub temperature: f32,

    /// HTTP timeout for one completion request.
    pub request_timeout: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: "${OPENAI_API_KEY}".to_string(),
            temperature: 0.0,
            request_timeout: "60s".to_string(),
        }
    }
}

impl LlmSettings {
    /// Get the API key with environment variables expanded.
    pub fn resolved_api_key(&self) -> Result<String, SettingsError> {
        expand_env_vars(&self.api_key)
    }

    pub fn timeout(&self) -> Result<Duration, SettingsError> {
        parse_duration(&self.request_timeout)
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `CLIPCOUNT_CONFIG`
    /// 2. `./clipcount.toml`
    /// 3. `~/.config/clipcount/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("clipcount.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("clipcount").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Check values that parse but make no sense.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.database.path.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "database.path must not be empty".to_string(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(SettingsError::InvalidConfig(format!(
                "llm.temperature must be between 0.0 and 2.0, got {}",
                self.llm.temperature
            )));
        }
        parse_duration(&self.database.query_timeout)?;
        parse_duration(&self.llm.request_timeout)?;
        Ok(())
    }
}

/// Parse a duration such as `"500ms"`, `"30s"`, `"5m"` or `"1m 30s"`.
pub fn parse_duration(s: &str) -> Result<Duration, SettingsError> {
    humantime::parse_duration(s.trim())
        .map_err(|e| SettingsError::InvalidDuration(format!("'{}': {}", s, e)))
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.peek() == Some(&'{') {
            chars.next();
            chars.by_ref().take_while(|&ch| ch != '}').collect()
        } else {
            let mut name = String::new();
            while let Some(&ch) = chars.peek() {
                if !(ch.is_alphanumeric() || ch == '_') {
                    break;
                }
                name.push(ch);
                chars.next();
            }
            if name.is_empty() {
                // Lone $
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
