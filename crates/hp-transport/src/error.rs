//! Transport errors

use hp_core::error::SessionError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the russh transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// SSH protocol or channel failure
    #[error("SSH error: {0}")]
    Ssh(#[from] russh::Error),

    /// SFTP request failure
    #[error("SFTP error: {0}")]
    Sftp(#[from] russh_sftp::client::error::Error),

    /// Private key could not be read or decrypted
    #[error("Failed to load private key {}: {source}", path.display())]
    Key {
        path: PathBuf,
        #[source]
        source: russh_keys::Error,
    },

    /// Local I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TransportError> for SessionError {
    fn from(e: TransportError) -> Self {
        match e {
            TransportError::Io(e) => SessionError::Io(e),
            other => SessionError::Channel(other.to_string()),
        }
    }
}

/// Attach a remote path to an SFTP failure
pub(crate) fn remote_error(path: &str, e: impl std::fmt::Display) -> SessionError {
    SessionError::Remote {
        path: path.to_string(),
        message: e.to_string(),
    }
}
