//! File transfer over the SFTP subsystem

use async_trait::async_trait;
use russh::client::Handle;
use russh_sftp::client::SftpSession;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use walkdir::WalkDir;

use hp_core::error::SessionError;
use hp_core::traits::{FileTransfer, RemoteKind, TransferStats};

use crate::error::{remote_error, TransportError};
use crate::handler::ClientHandler;

/// SFTP channel on one host
pub struct SftpTransfer {
    sftp: SftpSession,
}

impl SftpTransfer {
    pub(crate) async fn open(handle: &Handle<ClientHandler>, host: &str) -> Result<Self, TransportError> {
        let channel = handle.channel_open_session().await?;
        channel.request_subsystem(true, "sftp").await?;
        let sftp = SftpSession::new(channel.into_stream()).await?;
        tracing::debug!("SFTP channel open on {}", host);
        Ok(Self { sftp })
    }

    async fn ensure_dir(&self, path: &str) -> Result<(), SessionError> {
        let exists = self
            .sftp
            .try_exists(path)
            .await
            .map_err(|e| remote_error(path, e))?;
        if !exists {
            self.sftp
                .create_dir(path)
                .await
                .map_err(|e| remote_error(path, e))?;
        }
        Ok(())
    }

    async fn put_file(&self, local: &Path, remote: &str) -> Result<u64, SessionError> {
        let mut source = tokio::fs::File::open(local).await?;
        let mut target = self
            .sftp
            .create(remote)
            .await
            .map_err(|e| remote_error(remote, e))?;
        let bytes = tokio::io::copy(&mut source, &mut target).await?;
        target.shutdown().await?;
        Ok(bytes)
    }

    async fn get_file(&self, remote: &str, local: &Path) -> Result<u64, SessionError> {
        let mut source = self
            .sftp
            .open(remote)
            .await
            .map_err(|e| remote_error(remote, e))?;
        let mut target = tokio::fs::File::create(local).await?;
        let bytes = tokio::io::copy(&mut source, &mut target).await?;
        target.flush().await?;
        Ok(bytes)
    }
}

#[async_trait]
impl FileTransfer for SftpTransfer {
    async fn remote_kind(&mut self, path: &str) -> Result<RemoteKind, SessionError> {
        if !self
            .sftp
            .try_exists(path)
            .await
            .map_err(|e| remote_error(path, e))?
        {
            return Ok(RemoteKind::Missing);
        }
        let metadata = self
            .sftp
            .metadata(path)
            .await
            .map_err(|e| remote_error(path, e))?;
        Ok(if metadata.is_dir() {
            RemoteKind::Directory
        } else {
            RemoteKind::File
        })
    }

    async fn upload(&mut self, local: &Path, remote: &str) -> Result<TransferStats, SessionError> {
        let mut stats = TransferStats::default();

        for entry in WalkDir::new(local).sort_by_file_name() {
            let entry = entry.map_err(|e| SessionError::Io(e.into()))?;
            let relative = entry.path().strip_prefix(local).unwrap_or(entry.path());
            let target = remote_target(remote, relative);

            if entry.file_type().is_dir() {
                self.ensure_dir(&target).await?;
            } else if entry.file_type().is_file() {
                stats.bytes += self.put_file(entry.path(), &target).await?;
                stats.files += 1;
            } else {
                tracing::debug!("Skipping {}", entry.path().display());
            }
        }

        Ok(stats)
    }

    async fn download(&mut self, remote: &str, local: &Path) -> Result<TransferStats, SessionError> {
        let mut stats = TransferStats::default();

        let metadata = self
            .sftp
            .metadata(remote)
            .await
            .map_err(|e| remote_error(remote, e))?;
        if !metadata.is_dir() {
            stats.bytes += self.get_file(remote, local).await?;
            stats.files += 1;
            return Ok(stats);
        }

        let mut pending = vec![(remote.to_string(), local.to_path_buf())];
        while let Some((dir, target)) = pending.pop() {
            tokio::fs::create_dir_all(&target).await?;
            let entries = self
                .sftp
                .read_dir(dir.as_str())
                .await
                .map_err(|e| remote_error(&dir, e))?;

            for entry in entries {
                let name = entry.file_name();
                if name == "." || name == ".." {
                    continue;
                }
                let path = format!("{}/{}", dir.trim_end_matches('/'), name);
                let metadata = entry.metadata();
                if metadata.is_dir() {
                    pending.push((path, target.join(&name)));
                } else if metadata.is_symlink() {
                    tracing::debug!("Skipping symlink {}", path);
                } else {
                    stats.bytes += self.get_file(&path, &target.join(&name)).await?;
                    stats.files += 1;
                }
            }
        }

        Ok(stats)
    }
}

/// Remote path for a file found under an uploaded directory
fn remote_target(remote: &str, relative: &Path) -> String {
    let mut target = remote.trim_end_matches('/').to_string();
    if target.is_empty() {
        target.push('/');
    }
    for component in relative.components() {
        if !target.ends_with('/') {
            target.push('/');
        }
        target.push_str(&component.as_os_str().to_string_lossy());
    }
    target
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_target() {
        assert_eq!(remote_target("/srv/site", Path::new("")), "/srv/site");
        assert_eq!(remote_target("/srv/site/", Path::new("css/main.css")), "/srv/site/css/main.css");
        assert_eq!(remote_target("/", Path::new("a.txt")), "/a.txt");
        assert_eq!(remote_target("backup", Path::new("db/dump.sql")), "backup/db/dump.sql");
    }
}
