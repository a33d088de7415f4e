//! Core domain types

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{expand_tilde, HostRecord};
use crate::error::ResolveError;

/// Credentials offered to a host, in the order they are tried
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthFactors {
    /// Private key file and optional passphrase
    pub private_key: Option<PathBuf>,
    pub passphrase: Option<String>,
    /// Password
    pub password: Option<String>,
}

impl AuthFactors {
    /// Whether at least one credential is present
    pub fn is_viable(&self) -> bool {
        self.private_key.is_some() || self.password.is_some()
    }
}

// Secrets stay out of logs
impl fmt::Debug for AuthFactors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthFactors")
            .field("private_key", &self.private_key)
            .field("passphrase", &self.passphrase.as_ref().map(|_| "***"))
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

/// A host record with defaults applied, ready to connect to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveHost {
    pub name: String,
    pub tags: Vec<String>,
    pub address: String,
    pub port: u16,
    pub user: String,
    pub auth: AuthFactors,
    /// Keep-alive interval, if any
    pub keep_alive: Option<Duration>,
    /// Name of the host this one is reached through
    pub proxy: Option<String>,
}

impl EffectiveHost {
    /// `address:port` form used for dialing and tunneling
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Build from a record that already had its context defaults merged.
    ///
    /// Fails when user, address, port, or every credential is missing.
    pub fn from_merged(record: &HostRecord) -> Result<Self, ResolveError> {
        let incomplete = |field| ResolveError::Incomplete {
            host: record.name.clone(),
            field,
        };

        let user = non_empty(&record.user).ok_or_else(|| incomplete("user"))?;
        if record.address.trim().is_empty() {
            return Err(incomplete("address"));
        }
        let port = record
            .port
            .filter(|p| *p != 0)
            .ok_or_else(|| incomplete("port"))?;

        let auth = AuthFactors {
            private_key: non_empty(&record.private_key).map(|k| expand_tilde(&k)),
            passphrase: non_empty(&record.private_key_password),
            password: non_empty(&record.password),
        };
        if !auth.is_viable() {
            return Err(incomplete("password or private key"));
        }

        Ok(Self {
            name: record.name.clone(),
            tags: record.tags.clone(),
            address: record.address.clone(),
            port,
            user,
            auth,
            keep_alive: record
                .keep_alive
                .filter(|s| *s != 0)
                .map(Duration::from_secs),
            proxy: non_empty(&record.proxy),
        })
    }
}

impl fmt::Display for EffectiveHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.user, self.address, self.port)
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}
