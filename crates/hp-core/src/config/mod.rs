//! Configuration management for hostpool

mod context;
mod host;
pub mod serde_utils;
mod settings;

pub use context::{Context, BASE_CONTEXT};
pub use host::{validate_name, Defaults, HostRecord, MAX_NAME_LEN};
pub use settings::{Settings, DEFAULT_MAX_HOPS};

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Environment variable overriding the configuration directory
pub const HOME_ENV: &str = "HOSTPOOL_HOME";

/// Get the default configuration directory
pub fn default_config_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(HOME_ENV) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".hostpool")
}

/// Get the settings file path inside a configuration directory
pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join("config.toml")
}

/// Load settings, falling back to defaults when the file is missing
pub fn load_settings(config_dir: &Path) -> Result<Settings, ConfigError> {
    let settings = match load_config::<Settings>(&settings_path(config_dir)) {
        Ok(settings) => settings,
        Err(ConfigError::NotFound(_)) => Settings::default(),
        Err(e) => return Err(e),
    };
    settings.validate()?;
    Ok(settings)
}

/// Save settings to the configuration directory
pub fn save_settings(config_dir: &Path, settings: &Settings) -> Result<(), ConfigError> {
    save_config(&settings_path(config_dir), settings)
}

/// Load configuration from a file
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to a file, replacing its previous content
pub fn save_config<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(config)?;

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}

/// Expand a leading `~` to the home directory
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
