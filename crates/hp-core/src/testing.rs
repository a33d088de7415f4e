//! Scripted in-process transport for tests
//!
//! Every host's "remote" filesystem is a directory named after the host under
//! a shared root, so transfers can be checked with plain `std::fs`.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::error::{ConnectStage, FailureCause, SessionError};
use crate::traits::{
    FileTransfer, HopSession, PtyRequest, RemoteKind, RemoteShell, ShellHandle, ShellInput,
    ShellOutput, TransferStats,
};
use crate::types::EffectiveHost;

type Log = Arc<Mutex<Vec<String>>>;

#[derive(Default)]
pub(crate) struct FakeShell {
    log: Log,
    failures: HashMap<(String, ConnectStage), FailureCause>,
    hangs: HashSet<(String, ConnectStage)>,
    broken_transfers: HashSet<String>,
    remote_root: PathBuf,
}

impl FakeShell {
    pub(crate) fn new(remote_root: impl Into<PathBuf>) -> Self {
        Self {
            remote_root: remote_root.into(),
            ..Default::default()
        }
    }

    /// Make a step on `host` fail with `cause`
    pub(crate) fn fail(mut self, host: &str, stage: ConnectStage, cause: FailureCause) -> Self {
        self.failures.insert((host.to_string(), stage), cause);
        self
    }

    /// Make a step on `host` never complete
    pub(crate) fn hang(mut self, host: &str, stage: ConnectStage) -> Self {
        self.hangs.insert((host.to_string(), stage));
        self
    }

    /// Make every file operation on `host` fail
    pub(crate) fn break_transfers(mut self, host: &str) -> Self {
        self.broken_transfers.insert(host.to_string());
        self
    }

    /// Remote filesystem root of `host`
    pub(crate) fn host_root(&self, host: &str) -> PathBuf {
        self.remote_root.join(host)
    }

    /// Events recorded so far
    pub(crate) fn events(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn record(&self, event: String) {
        self.log.lock().unwrap().push(event);
    }

    async fn step(&self, host: &EffectiveHost, stage: ConnectStage) -> Result<(), FailureCause> {
        let key = (host.name.clone(), stage);
        if self.hangs.contains(&key) {
            std::future::pending::<()>().await;
        }
        match self.failures.get(&key) {
            Some(cause) => Err(cause.clone()),
            None => Ok(()),
        }
    }
}

pub(crate) struct FakeLink {
    address: String,
}

#[async_trait]
impl RemoteShell for FakeShell {
    type Link = FakeLink;
    type Session = FakeSession;

    async fn dial(&self, host: &EffectiveHost) -> Result<FakeLink, FailureCause> {
        self.record(format!("dial {}", host.socket_address()));
        self.step(host, ConnectStage::Dial).await?;
        Ok(FakeLink {
            address: host.socket_address(),
        })
    }

    async fn tunnel(&self, via: &FakeSession, host: &EffectiveHost) -> Result<FakeLink, FailureCause> {
        self.record(format!("tunnel {} -> {}", via.name, host.socket_address()));
        self.step(host, ConnectStage::Tunnel).await?;
        Ok(FakeLink {
            address: host.socket_address(),
        })
    }

    async fn authenticate(&self, link: FakeLink, host: &EffectiveHost) -> Result<FakeSession, FailureCause> {
        self.record(format!("auth {}@{}", host.user, link.address));
        self.step(host, ConnectStage::Authenticate).await?;
        Ok(FakeSession {
            name: host.name.clone(),
            root: self.host_root(&host.name),
            broken: self.broken_transfers.contains(&host.name),
            log: self.log.clone(),
        })
    }
}

pub(crate) struct FakeSession {
    name: String,
    root: PathBuf,
    broken: bool,
    log: Log,
}

#[async_trait]
impl HopSession for FakeSession {
    type Transfer = FakeTransfer;

    async fn open_shell(&self, _pty: PtyRequest) -> Result<ShellHandle, SessionError> {
        let (in_tx, mut in_rx) = mpsc::channel(16);
        let (out_tx, out_rx) = mpsc::channel(16);
        // Echo input back until end of input
        tokio::spawn(async move {
            while let Some(input) = in_rx.recv().await {
                match input {
                    ShellInput::Data(data) => {
                        let _ = out_tx.send(ShellOutput::Stdout(data)).await;
                    }
                    ShellInput::Resize(_) => {}
                    ShellInput::Eof => {
                        let _ = out_tx.send(ShellOutput::Exit(0)).await;
                        break;
                    }
                }
            }
        });
        Ok(ShellHandle::new(in_tx, out_rx))
    }

    async fn open_transfer(&self) -> Result<FakeTransfer, SessionError> {
        Ok(FakeTransfer {
            root: self.root.clone(),
            broken: self.broken,
        })
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.log.lock().unwrap().push(format!("close {}", self.name));
        Ok(())
    }
}

pub(crate) struct FakeTransfer {
    root: PathBuf,
    broken: bool,
}

impl FakeTransfer {
    fn local(&self, remote: &str) -> PathBuf {
        self.root.join(remote.trim_start_matches('/'))
    }

    fn check(&self, path: &str) -> Result<(), SessionError> {
        if self.broken {
            return Err(SessionError::Remote {
                path: path.to_string(),
                message: "permission denied".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl FileTransfer for FakeTransfer {
    async fn remote_kind(&mut self, path: &str) -> Result<RemoteKind, SessionError> {
        self.check(path)?;
        let path = self.local(path);
        Ok(if path.is_dir() {
            RemoteKind::Directory
        } else if path.exists() {
            RemoteKind::File
        } else {
            RemoteKind::Missing
        })
    }

    async fn upload(&mut self, local: &Path, remote: &str) -> Result<TransferStats, SessionError> {
        self.check(remote)?;
        Ok(copy_tree(local, &self.local(remote))?)
    }

    async fn download(&mut self, remote: &str, local: &Path) -> Result<TransferStats, SessionError> {
        self.check(remote)?;
        Ok(copy_tree(&self.local(remote), local)?)
    }
}

fn copy_tree(from: &Path, to: &Path) -> std::io::Result<TransferStats> {
    let mut stats = TransferStats::default();
    if from.is_dir() {
        std::fs::create_dir_all(to)?;
        for entry in std::fs::read_dir(from)? {
            let entry = entry?;
            stats += copy_tree(&entry.path(), &to.join(entry.file_name()))?;
        }
    } else {
        stats.bytes += std::fs::copy(from, to)?;
        stats.files += 1;
    }
    Ok(stats)
}

/// A complete host with a password
pub(crate) fn host(name: &str, address: &str, port: u16) -> EffectiveHost {
    EffectiveHost {
        name: name.to_string(),
        tags: Vec::new(),
        address: address.to_string(),
        port,
        user: "ops".to_string(),
        auth: crate::types::AuthFactors {
            password: Some("pw".to_string()),
            ..Default::default()
        },
        keep_alive: None,
        proxy: None,
    }
}
