//! Configuration management for Keyscribe.
//!
//! Configuration is loaded from the platform config directory with sensible
//! defaults. Secrets may be written as `${ENV_VAR}` references and are resolved
//! at the point of use, so the file itself never needs to hold a token.

mod types;
mod validate;

pub use types::*;

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Root configuration structure for Keyscribe.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Proxy server settings
    pub proxy: ProxyConfig,

    /// Orchestrator settings
    pub client: ClientConfig,

    /// Remote model identifiers
    pub models: ModelsConfig,

    /// Resource limits
    pub limits: LimitsConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default configuration if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default config file path.
    ///
    /// Uses platform-appropriate directories:
    /// - macOS: ~/Library/Application Support/com.keyscribe.keyscribe/config.toml
    /// - Linux: ~/.config/keyscribe/config.toml
    /// - Windows: C:\Users\<User>\AppData\Roaming\keyscribe\config\config.toml
    ///
    /// Falls back to ~/.keyscribe/config.toml if directory detection fails.
    pub fn default_path() -> PathBuf {
        directories::ProjectDirs::from("com", "keyscribe", "keyscribe")
            .map(|dirs| dirs.config_dir().to_path_buf().join("config.toml"))
            .unwrap_or_else(|| {
                PathBuf::from(shellexpand::tilde("~/.keyscribe/config.toml").into_owned())
            })
    }

    /// Bearer token the orchestrator forwards, with `${ENV_VAR}` resolved.
    pub fn client_token(&self) -> Option<String> {
        resolve_env_var(&self.client.token)
    }

    /// Server-side token for the `/generate` endpoint, with `${ENV_VAR}` resolved.
    pub fn proxy_token(&self) -> Option<String> {
        resolve_env_var(&self.proxy.token)
    }

    /// Serialize the config to a pretty TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationError(e.to_string()))
    }
}

/// Resolve `${ENV_VAR}` references in config strings.
///
/// Plain values pass through; empty values and unset variables resolve to `None`.
pub fn resolve_env_var(value: &str) -> Option<String> {
    if value.starts_with("${") && value.ends_with('}') {
        let var_name = &value[2..value.len() - 1];
        std::env::var(var_name).ok().filter(|v| !v.is_empty())
    } else if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}
