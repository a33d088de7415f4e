//! Context files: one set of defaults plus the hosts that use them

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::host::{Defaults, HostRecord};
use super::{load_config, save_config};
use crate::error::ConfigError;

/// Name of the context backed by `base.toml`
pub const BASE_CONTEXT: &str = "base";

/// A named, independently persisted collection of hosts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Context {
    /// Known tags, in insertion order
    pub tags: Vec<String>,

    /// Fallback settings for hosts in this context
    pub defaults: Defaults,

    /// Host records, sorted by name
    pub hosts: Vec<HostRecord>,

    #[serde(skip)]
    name: String,

    #[serde(skip)]
    path: PathBuf,
}

impl Context {
    /// Create an empty context backed by `path`
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    /// Load a context, starting empty when its file does not exist yet
    pub fn load(name: impl Into<String>, path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let name = name.into();
        let path = path.into();
        match load_config::<Context>(&path) {
            Ok(mut ctx) => {
                ctx.name = name;
                ctx.path = path;
                ctx.sort_hosts();
                Ok(ctx)
            }
            Err(ConfigError::NotFound(_)) => {
                tracing::debug!("Context file {:?} missing, starting empty", path);
                Ok(Self::new(name, path))
            }
            Err(e) => Err(e),
        }
    }

    /// Rewrite the whole context file
    pub fn save(&self) -> Result<(), ConfigError> {
        save_config(&self.path, self)
    }

    /// Context name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether two contexts are backed by the same file
    pub fn same_location(&self, other: &Context) -> bool {
        same_file(&self.path, &other.path)
    }

    /// Register tags not seen before, keeping existing order
    pub fn register_tags<'a>(&mut self, tags: impl IntoIterator<Item = &'a String>) {
        for tag in tags {
            if !self.tags.iter().any(|t| t == tag) {
                self.tags.push(tag.clone());
            }
        }
    }

    /// Sort hosts by name
    pub fn sort_hosts(&mut self) {
        self.hosts.sort_by(|a, b| a.name.cmp(&b.name));
    }
}

/// Compare two paths by identity, canonicalizing when both exist
pub(crate) fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
