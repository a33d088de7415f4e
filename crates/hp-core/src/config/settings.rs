//! Application settings (`config.toml`)

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::context::BASE_CONTEXT;
use crate::error::ConfigError;
use super::serde_utils::duration_secs;

/// Default upper bound on proxy chain length
pub const DEFAULT_MAX_HOPS: usize = 8;

/// Settings shared by every command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Name of the active working context
    pub current_context: String,

    /// Timeout for each dial, tunnel and authentication step
    #[serde(with = "duration_secs")]
    pub connect_timeout: Duration,

    /// Timeout for a whole transfer to one host
    #[serde(with = "duration_secs")]
    pub transfer_timeout: Duration,

    /// Maximum number of hops in a proxy chain
    pub max_hops: usize,

    /// Named contexts and their backing files
    pub contexts: BTreeMap<String, PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            current_context: BASE_CONTEXT.to_string(),
            connect_timeout: Duration::from_secs(10),
            transfer_timeout: Duration::from_secs(600),
            max_hops: DEFAULT_MAX_HOPS,
            contexts: BTreeMap::new(),
        }
    }
}

impl Settings {
    /// Path of the file backing a context.
    ///
    /// `base` always lives in `<dir>/base.toml`; other contexts use their
    /// registered path, falling back to `<dir>/contexts/<name>.toml`.
    pub fn context_path(&self, config_dir: &Path, name: &str) -> PathBuf {
        if name == BASE_CONTEXT {
            return config_dir.join("base.toml");
        }
        self.contexts
            .get(name)
            .cloned()
            .unwrap_or_else(|| config_dir.join("contexts").join(format!("{}.toml", name)))
    }

    /// Reject values no command can work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_hops == 0 {
            return Err(ConfigError::Invalid("max_hops must be at least 1".into()));
        }
        if self.connect_timeout.is_zero() {
            return Err(ConfigError::Invalid("connect_timeout must be positive".into()));
        }
        if self.transfer_timeout.is_zero() {
            return Err(ConfigError::Invalid("transfer_timeout must be positive".into()));
        }
        if self.contexts.contains_key(BASE_CONTEXT) {
            return Err(ConfigError::Invalid(format!(
                "context {:?} is reserved",
                BASE_CONTEXT
            )));
        }
        Ok(())
    }

    /// Whether a context name is known
    pub fn has_context(&self, name: &str) -> bool {
        name == BASE_CONTEXT || self.contexts.contains_key(name)
    }
}
