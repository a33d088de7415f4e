//! CLI command implementations

mod copy;
mod ctx;
mod host;
mod login;

pub use copy::copy_command;
pub use ctx::{ctx_add, ctx_list, ctx_remove, ctx_use};
pub use host::{add_command, delete_command, edit_command, list_command, show_command, HostArgs};
pub use login::login_command;

use std::path::PathBuf;

use anyhow::{Context, Result};

use hp_core::config::{self, Settings};
use hp_core::{ConnectionManager, HpError, Registry};
use hp_transport::RusshShell;

/// The configuration directory and the settings loaded from it
#[derive(Debug, Clone)]
pub struct Workspace {
    pub config_dir: PathBuf,
    pub settings: Settings,
}

impl Workspace {
    /// Load settings from `config_dir`, using defaults when none are saved
    pub fn load(config_dir: PathBuf) -> Result<Self, HpError> {
        let settings = config::load_settings(&config_dir)?;
        tracing::debug!(
            "Using {:?}, context {}",
            config_dir,
            settings.current_context
        );
        Ok(Self {
            config_dir,
            settings,
        })
    }

    /// Open the base and current contexts
    pub fn registry(&self) -> Result<Registry, HpError> {
        Ok(Registry::open(&self.config_dir, &self.settings)?)
    }

    /// Persist the settings
    pub fn save(&self) -> Result<()> {
        config::save_settings(&self.config_dir, &self.settings)
            .with_context(|| format!("Failed to save settings in {:?}", self.config_dir))
    }

    /// Connection manager over SSH with the configured step timeout
    pub fn connection_manager(&self) -> ConnectionManager<RusshShell> {
        ConnectionManager::new(RusshShell::new(), self.settings.connect_timeout)
    }
}
