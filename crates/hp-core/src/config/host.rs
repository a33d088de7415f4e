//! Host records and per-context defaults

use serde::{Deserialize, Serialize};

/// Maximum length of a host name, in characters
pub const MAX_NAME_LEN: usize = 12;

/// Fallback connection settings shared by every host in a context
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Defaults {
    /// SSH user name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Password for password authentication
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Path to a private key file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,

    /// Passphrase protecting the private key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key_password: Option<String>,

    /// SSH port
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    /// Keep-alive interval in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<u64>,
}

/// A named remote endpoint as stored in a context file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostRecord {
    /// Unique name of the host
    pub name: String,

    /// Tags for grouping
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    /// Network address (hostname or IP)
    pub address: String,

    /// SSH port, `None` or `0` means "use the default"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub private_key_password: Option<String>,

    /// Keep-alive interval in seconds, `None` or `0` means "use the default"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<u64>,

    /// Name of the host this one is reached through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
}

impl HostRecord {
    /// Create a host record with just a name and an address
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            ..Default::default()
        }
    }

    /// Check if the host has a specific tag
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Fill unset fields from `defaults`.
    ///
    /// The private key and its passphrase are only taken from the defaults
    /// when the password is also unset. A host with an explicit password and
    /// no key therefore never inherits the default key.
    pub fn merge_defaults(&mut self, defaults: &Defaults) {
        if is_unset(&self.user) {
            self.user = defaults.user.clone();
        }
        if is_unset(&self.password) {
            self.password = defaults.password.clone();
            if is_unset(&self.private_key) {
                self.private_key = defaults.private_key.clone();
            }
            if is_unset(&self.private_key_password) {
                self.private_key_password = defaults.private_key_password.clone();
            }
        }
        if self.port.unwrap_or(0) == 0 {
            self.port = defaults.port;
        }
        if self.keep_alive.unwrap_or(0) == 0 {
            self.keep_alive = defaults.keep_alive;
        }
    }
}

fn is_unset(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

/// Check a host name against the length rules
pub fn validate_name(name: &str) -> Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("name is empty");
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err("name too long");
    }
    Ok(())
}
