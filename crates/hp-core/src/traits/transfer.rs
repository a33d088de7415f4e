//! File transfer channel

use async_trait::async_trait;
use std::ops::AddAssign;
use std::path::Path;

use crate::error::SessionError;

/// What a remote path currently refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteKind {
    File,
    Directory,
    Missing,
}

/// Amount of data moved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferStats {
    pub files: u64,
    pub bytes: u64,
}

impl AddAssign for TransferStats {
    fn add_assign(&mut self, other: Self) {
        self.files += other.files;
        self.bytes += other.bytes;
    }
}

/// File operations on one remote host.
///
/// `upload` and `download` copy to exactly the path given; deciding whether a
/// destination is a directory to copy *into* is up to the caller. Directories
/// are copied recursively. Remote paths use `/` separators.
#[async_trait]
pub trait FileTransfer: Send {
    /// Inspect a remote path
    async fn remote_kind(&mut self, path: &str) -> Result<RemoteKind, SessionError>;

    /// Copy a local file or directory tree to `remote`
    async fn upload(&mut self, local: &Path, remote: &str) -> Result<TransferStats, SessionError>;

    /// Copy a remote file or directory tree to `local`
    async fn download(&mut self, remote: &str, local: &Path) -> Result<TransferStats, SessionError>;
}
