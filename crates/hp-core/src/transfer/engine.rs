//! Fan-out copy engine
//!
//! Every resolved host gets its own worker: build the proxy chain, connect,
//! open a transfer channel, copy, close. Group operations run one tokio task
//! per host and a failing host never affects its siblings.

use futures::future::join_all;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::endpoint::{remote_basename, remote_join, CopyPlan, RemotePath};
use super::report::{HostOutcome, TransferReport};
use crate::chain::ProxyChainBuilder;
use crate::config::DEFAULT_MAX_HOPS;
use crate::connection::{Connection, ConnectionManager};
use crate::error::{ResolveError, SessionError, TransferError};
use crate::resolver::Resolver;
use crate::traits::{FileTransfer, HopSession, RemoteKind, RemoteShell, TransferStats};
use crate::types::EffectiveHost;

/// A resolved host and the hops in front of it
struct HostJob {
    target: Arc<EffectiveHost>,
    chain: Arc<Vec<EffectiveHost>>,
}

enum Planned {
    Ready(HostJob),
    /// The host could not be planned; recorded without connecting
    Failed(HostOutcome),
}

/// Work done on each host once connected
enum HostTask {
    Upload {
        sources: Vec<PathBuf>,
        remote: String,
    },
    Download {
        remote: String,
        local: PathBuf,
        /// Write into `local/<host name>/`
        per_host: bool,
    },
}

/// Runs copies against one host or a tag-selected group
pub struct TransferEngine<R: RemoteShell> {
    manager: ConnectionManager<R>,
    transfer_timeout: Duration,
    max_hops: usize,
    cancel: CancellationToken,
}

impl<R: RemoteShell> TransferEngine<R> {
    pub fn new(manager: ConnectionManager<R>, transfer_timeout: Duration) -> Self {
        Self {
            manager,
            transfer_timeout,
            max_hops: DEFAULT_MAX_HOPS,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Use `cancel` to stop outstanding workers
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Parse `cp` arguments and run the copy
    pub async fn copy<S: AsRef<str>>(
        &self,
        resolver: Resolver<'_>,
        sources: &[S],
        destination: &str,
        group: bool,
    ) -> Result<TransferReport, TransferError> {
        let plan = CopyPlan::parse(sources, destination, group)?;
        self.execute(resolver, plan, group).await
    }

    /// Run a validated copy plan.
    ///
    /// Errors returned here abort the whole copy; per-host connection and
    /// transfer failures are reported in the [`TransferReport`] instead.
    pub async fn execute(
        &self,
        resolver: Resolver<'_>,
        plan: CopyPlan,
        group: bool,
    ) -> Result<TransferReport, TransferError> {
        match plan {
            CopyPlan::Upload {
                sources,
                destination,
            } => {
                if let Some(missing) = sources.iter().find(|s| !s.exists()) {
                    return Err(TransferError::InvalidEndpoint(format!(
                        "{}: no such file or directory",
                        missing.display()
                    )));
                }
                let planned = self.plan_hosts(resolver, &destination.identifier, group)?;
                let task = HostTask::Upload {
                    sources,
                    remote: destination.path,
                };
                Ok(self.run_all(planned, task, group).await)
            }
            CopyPlan::Download {
                source,
                destination,
            } => {
                let planned = self.plan_hosts(resolver, &source.identifier, group)?;
                let task = HostTask::Download {
                    remote: source.path,
                    local: destination,
                    per_host: group,
                };
                Ok(self.run_all(planned, task, group).await)
            }
            CopyPlan::Relay {
                sources,
                destination,
            } => self.relay(resolver, sources, destination).await,
        }
    }

    fn plan_hosts(
        &self,
        resolver: Resolver<'_>,
        identifier: &str,
        group: bool,
    ) -> Result<Vec<Planned>, TransferError> {
        let targets = resolver.resolve_target(identifier, group)?;
        if targets.is_empty() {
            return Err(ResolveError::TagEmpty(identifier.to_string()).into());
        }

        let builder = ProxyChainBuilder::new(resolver).with_max_hops(self.max_hops);
        targets
            .into_iter()
            .map(|(name, resolved)| {
                let planned = resolved.and_then(|target| {
                    let chain = builder.chain(&target)?;
                    Ok((target, chain))
                });
                match planned {
                    Ok((target, chain)) => Ok(Planned::Ready(HostJob {
                        target: Arc::new(target),
                        chain: Arc::new(chain),
                    })),
                    Err(e) if group => {
                        tracing::warn!("{}: {}", name, e);
                        Ok(Planned::Failed(HostOutcome {
                            host: name,
                            result: Err(TransferError::Resolve(e)),
                        }))
                    }
                    Err(e) => Err(e.into()),
                }
            })
            .collect()
    }

    fn single_job(&self, resolver: Resolver<'_>, name: &str) -> Result<HostJob, TransferError> {
        let target = resolver.effective(name)?;
        let chain = ProxyChainBuilder::new(resolver)
            .with_max_hops(self.max_hops)
            .chain(&target)?;
        Ok(HostJob {
            target: Arc::new(target),
            chain: Arc::new(chain),
        })
    }

    async fn run_all(&self, planned: Vec<Planned>, task: HostTask, group: bool) -> TransferReport {
        let task = Arc::new(task);

        if !group {
            let mut report = TransferReport::default();
            for entry in planned {
                let outcome = match entry {
                    Planned::Ready(job) => self.run_one(job, task.clone()).await,
                    Planned::Failed(outcome) => outcome,
                };
                report.outcomes.push(outcome);
            }
            return report;
        }

        let (hosts, handles): (Vec<String>, Vec<_>) = planned
            .into_iter()
            .map(|entry| match entry {
                Planned::Ready(job) => (
                    job.target.name.clone(),
                    tokio::spawn(run_host(
                        self.manager.clone(),
                        job,
                        task.clone(),
                        self.transfer_timeout,
                        self.cancel.clone(),
                    )),
                ),
                Planned::Failed(outcome) => (outcome.host.clone(), tokio::spawn(async move { outcome })),
            })
            .unzip();

        tracing::info!("Copying on {} host(s)", hosts.len());
        let outcomes = join_all(handles)
            .await
            .into_iter()
            .zip(hosts)
            .map(|(joined, host)| {
                joined.unwrap_or_else(|e| HostOutcome {
                    host: host.clone(),
                    result: Err(TransferError::Failed {
                        host,
                        cause: format!("worker failed: {}", e),
                    }),
                })
            })
            .collect();

        TransferReport { outcomes }
    }

    async fn run_one(&self, job: HostJob, task: Arc<HostTask>) -> HostOutcome {
        run_host(
            self.manager.clone(),
            job,
            task,
            self.transfer_timeout,
            self.cancel.clone(),
        )
        .await
    }

    /// Remote to remote: download every source into a staging directory,
    /// then upload the staged copies to the destination host.
    async fn relay(
        &self,
        resolver: Resolver<'_>,
        sources: Vec<RemotePath>,
        destination: RemotePath,
    ) -> Result<TransferReport, TransferError> {
        let staging = tempfile::tempdir().map_err(|e| TransferError::Failed {
            host: destination.identifier.clone(),
            cause: format!("cannot create staging directory: {}", e),
        })?;

        let mut downloads = Vec::with_capacity(sources.len());
        for (index, source) in sources.into_iter().enumerate() {
            let name = remote_basename(&source.path)
                .ok_or_else(|| {
                    TransferError::InvalidEndpoint(format!(
                        "{}:{} does not name a file or directory",
                        source.identifier, source.path
                    ))
                })?
                .to_string();
            let slot = staging.path().join(index.to_string());
            std::fs::create_dir_all(&slot).map_err(|e| TransferError::Failed {
                host: source.identifier.clone(),
                cause: format!("cannot create staging directory: {}", e),
            })?;

            let job = self.single_job(resolver, &source.identifier)?;
            let task = HostTask::Download {
                remote: source.path,
                local: slot.clone(),
                per_host: false,
            };
            downloads.push((job, task, slot.join(name)));
        }
        let upload_job = self.single_job(resolver, &destination.identifier)?;

        let mut report = TransferReport::default();
        let mut staged = Vec::with_capacity(downloads.len());
        for (job, task, path) in downloads {
            let outcome = self.run_one(job, Arc::new(task)).await;
            let ok = outcome.is_success();
            report.outcomes.push(outcome);
            if !ok {
                return Ok(report);
            }
            staged.push(path);
        }

        let task = HostTask::Upload {
            sources: staged,
            remote: destination.path,
        };
        report.outcomes.push(self.run_one(upload_job, Arc::new(task)).await);
        Ok(report)
    }
}

async fn run_host<R: RemoteShell>(
    manager: ConnectionManager<R>,
    job: HostJob,
    task: Arc<HostTask>,
    timeout: Duration,
    cancel: CancellationToken,
) -> HostOutcome {
    let host = job.target.name.clone();
    let result = transfer_host(&manager, &job, &task, timeout, &cancel).await;

    match &result {
        Ok(stats) => tracing::info!("{}: copied {} file(s), {} bytes", host, stats.files, stats.bytes),
        Err(e) => tracing::warn!("{}", e),
    }
    HostOutcome { host, result }
}

async fn transfer_host<R: RemoteShell>(
    manager: &ConnectionManager<R>,
    job: &HostJob,
    task: &HostTask,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<TransferStats, TransferError> {
    let host = &job.target.name;

    let conn = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(TransferError::Cancelled { host: host.clone() }),
        conn = manager.connect(&job.chain, &job.target) => conn.map_err(|source| TransferError::Connection {
            host: host.clone(),
            source,
        })?,
    };

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(TransferError::Cancelled { host: host.clone() }),
        result = tokio::time::timeout(timeout, task.run(&conn)) => match result {
            Ok(result) => result.map_err(|e| TransferError::Failed {
                host: host.clone(),
                cause: e.to_string(),
            }),
            Err(_) => Err(TransferError::Failed {
                host: host.clone(),
                cause: format!("timed out after {:?}", timeout),
            }),
        },
    };

    conn.close().await;
    result
}

impl HostTask {
    async fn run<S: HopSession>(&self, conn: &Connection<S>) -> Result<TransferStats, SessionError> {
        let mut transfer = conn.open_transfer().await?;
        match self {
            HostTask::Upload { sources, remote } => upload(&mut transfer, sources, remote).await,
            HostTask::Download {
                remote,
                local,
                per_host,
            } => {
                let base = if *per_host {
                    let dir = local.join(conn.target());
                    tokio::fs::create_dir_all(&dir).await?;
                    dir
                } else {
                    local.clone()
                };
                download(&mut transfer, remote, &base).await
            }
        }
    }
}

async fn upload<T: FileTransfer>(
    transfer: &mut T,
    sources: &[PathBuf],
    remote: &str,
) -> Result<TransferStats, SessionError> {
    let into_dir = transfer.remote_kind(remote).await? == RemoteKind::Directory;
    if sources.len() > 1 && !into_dir {
        return Err(SessionError::Remote {
            path: remote.to_string(),
            message: "not a directory".to_string(),
        });
    }

    let mut stats = TransferStats::default();
    for source in sources {
        let target = if into_dir {
            let name = source
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| SessionError::Remote {
                    path: source.display().to_string(),
                    message: "source has no file name".to_string(),
                })?;
            remote_join(remote, name)
        } else {
            remote.to_string()
        };
        tracing::debug!("Uploading {} to {}", source.display(), target);
        stats += transfer.upload(source, &target).await?;
    }
    Ok(stats)
}

async fn download<T: FileTransfer>(
    transfer: &mut T,
    remote: &str,
    base: &Path,
) -> Result<TransferStats, SessionError> {
    if transfer.remote_kind(remote).await? == RemoteKind::Missing {
        return Err(SessionError::Remote {
            path: remote.to_string(),
            message: "no such file or directory".to_string(),
        });
    }

    let target = match remote_basename(remote) {
        Some(name) if base.is_dir() => base.join(name),
        _ => base.to_path_buf(),
    };
    tracing::debug!("Downloading {} to {}", remote, target.display());
    transfer.download(remote, &target).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Context, Defaults, HostRecord};
    use crate::error::{ConnectStage, FailureCause};
    use crate::registry::Registry;
    use crate::testing::FakeShell;
    use std::fs;
    use tempfile::TempDir;

    const STEP: Duration = Duration::from_millis(500);

    struct Setup {
        tmp: TempDir,
        shell: Arc<FakeShell>,
        registry: Registry,
    }

    impl Setup {
        /// Hosts are `(name, comma separated tags, proxy)`
        fn new(hosts: &[(&str, &str, Option<&str>)], shell: impl FnOnce(PathBuf) -> FakeShell) -> Self {
            let tmp = TempDir::new().unwrap();
            let mut ctx = Context::new("base", tmp.path().join("base.toml"));
            ctx.defaults = Defaults {
                user: Some("ops".into()),
                port: Some(22),
                password: Some("pw".into()),
                ..Default::default()
            };
            for (name, tags, proxy) in hosts {
                let mut record = HostRecord::new(*name, format!("{}.internal", name));
                record.tags = tags
                    .split(',')
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect();
                record.proxy = proxy.map(str::to_string);
                ctx.hosts.push(record);
            }
            ctx.sort_hosts();

            let shell = Arc::new(shell(tmp.path().join("remote")));
            Self {
                registry: Registry::single(ctx),
                shell,
                tmp,
            }
        }

        fn engine(&self) -> TransferEngine<FakeShell> {
            TransferEngine::new(
                ConnectionManager::from_shared(self.shell.clone(), STEP),
                Duration::from_secs(5),
            )
        }

        fn local(&self, rel: &str) -> PathBuf {
            self.tmp.path().join("local").join(rel)
        }

        fn remote(&self, host: &str, rel: &str) -> PathBuf {
            self.shell.host_root(host).join(rel)
        }

        fn write_local(&self, rel: &str, content: &str) -> String {
            write(&self.local(rel), content);
            self.local(rel).display().to_string()
        }

        fn write_remote(&self, host: &str, rel: &str, content: &str) {
            write(&self.remote(host, rel), content);
        }
    }

    fn write(path: &Path, content: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn hosts_of<'a>(outcomes: impl Iterator<Item = &'a HostOutcome>) -> Vec<&'a str> {
        outcomes.map(|o| o.host.as_str()).collect()
    }

    #[tokio::test]
    async fn test_group_upload_with_partial_failure() {
        let setup = Setup::new(
            &[
                ("web1", "web", None),
                ("web2", "web", None),
                ("web3", "web", None),
                ("web4", "web", None),
                ("db1", "db", None),
            ],
            |root| {
                FakeShell::new(root)
                    .fail("web2", ConnectStage::Authenticate, FailureCause::AuthRejected)
                    .break_transfers("web4")
            },
        );
        for host in ["web1", "web2", "web3", "web4"] {
            fs::create_dir_all(setup.remote(host, "srv")).unwrap();
        }
        let source = setup.write_local("app.conf", "listen 80");

        let report = setup
            .engine()
            .copy(Resolver::new(&setup.registry), &[source], "web:/srv", true)
            .await
            .unwrap();

        assert!(!report.is_success());
        assert_eq!(report.outcomes.len(), 4);
        assert_eq!(hosts_of(report.succeeded()), vec!["web1", "web3"]);
        assert_eq!(hosts_of(report.failed()), vec!["web2", "web4"]);
        for host in ["web1", "web3"] {
            assert_eq!(fs::read_to_string(setup.remote(host, "srv/app.conf")).unwrap(), "listen 80");
        }
        assert!(!setup.remote("db1", "srv/app.conf").exists());

        let web2 = &report.outcomes[1];
        match &web2.result {
            Err(TransferError::Connection { host, source }) => {
                assert_eq!(host, "web2");
                assert_eq!(source.stage, ConnectStage::Authenticate);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(matches!(
            &report.outcomes[3].result,
            Err(TransferError::Failed { host, .. }) if host == "web4"
        ));

        // Every connected session was closed, including the failed transfer
        let events = setup.shell.events();
        for host in ["web1", "web3", "web4"] {
            assert!(events.contains(&format!("close {}", host)), "{} not closed", host);
        }
    }

    #[tokio::test]
    async fn test_upload_directory_tree() {
        let setup = Setup::new(&[("web1", "", None)], FakeShell::new);
        setup.write_local("site/index.html", "<h1>hi</h1>");
        setup.write_local("site/css/main.css", "body {}");
        fs::create_dir_all(setup.remote("web1", "srv")).unwrap();

        let source = setup.local("site").display().to_string();
        let report = setup
            .engine()
            .copy(Resolver::new(&setup.registry), &[source], "web1:/srv", false)
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.totals().files, 2);
        assert!(setup.remote("web1", "srv/site/index.html").exists());
        assert!(setup.remote("web1", "srv/site/css/main.css").exists());
    }

    #[tokio::test]
    async fn test_upload_through_proxy() {
        let setup = Setup::new(
            &[("bastion", "", None), ("db1", "", Some("bastion"))],
            FakeShell::new,
        );
        let source = setup.write_local("schema.sql", "create table t();");
        fs::create_dir_all(setup.remote("db1", "tmp")).unwrap();

        let report = setup
            .engine()
            .copy(Resolver::new(&setup.registry), &[source], "db1:/tmp/schema.sql", false)
            .await
            .unwrap();
        assert!(report.is_success());
        assert!(setup.remote("db1", "tmp/schema.sql").exists());

        let events = setup.shell.events();
        assert_eq!(events[0], "dial bastion.internal:22");
        assert!(events.contains(&"tunnel bastion -> db1.internal:22".to_string()));
        assert!(events.ends_with(&["close db1".to_string(), "close bastion".to_string()]));
    }

    #[tokio::test]
    async fn test_download_single_host() {
        let setup = Setup::new(&[("db1", "", None)], FakeShell::new);
        setup.write_remote("db1", "var/log/syslog", "boot ok");
        fs::create_dir_all(setup.local("out")).unwrap();

        let destination = setup.local("out").display().to_string();
        let report = setup
            .engine()
            .copy(Resolver::new(&setup.registry), &["db1:/var/log/syslog"], &destination, false)
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(fs::read_to_string(setup.local("out/syslog")).unwrap(), "boot ok");
    }

    #[tokio::test]
    async fn test_group_download_lands_in_host_directories() {
        let setup = Setup::new(
            &[("db1", "db", None), ("db2", "db", None)],
            FakeShell::new,
        );
        setup.write_remote("db1", "etc/motd", "one");
        setup.write_remote("db2", "etc/motd", "two");

        let destination = setup.local("motds").display().to_string();
        let report = setup
            .engine()
            .copy(Resolver::new(&setup.registry), &["db:/etc/motd"], &destination, true)
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(fs::read_to_string(setup.local("motds/db1/motd")).unwrap(), "one");
        assert_eq!(fs::read_to_string(setup.local("motds/db2/motd")).unwrap(), "two");
    }

    #[tokio::test]
    async fn test_download_missing_remote_file() {
        let setup = Setup::new(&[("db1", "", None)], FakeShell::new);
        let destination = setup.local("out").display().to_string();

        let report = setup
            .engine()
            .copy(Resolver::new(&setup.registry), &["db1:/nope"], &destination, false)
            .await
            .unwrap();

        assert!(!report.is_success());
        assert!(matches!(&report.outcomes[0].result, Err(TransferError::Failed { .. })));
    }

    #[tokio::test]
    async fn test_relay_between_hosts() {
        let setup = Setup::new(&[("db1", "", None), ("web1", "", None)], FakeShell::new);
        setup.write_remote("db1", "data/dump.sql", "rows");
        fs::create_dir_all(setup.remote("web1", "backup")).unwrap();

        let report = setup
            .engine()
            .copy(Resolver::new(&setup.registry), &["db1:/data/dump.sql"], "web1:/backup", false)
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(hosts_of(report.succeeded()), vec!["db1", "web1"]);
        assert_eq!(fs::read_to_string(setup.remote("web1", "backup/dump.sql")).unwrap(), "rows");
    }

    #[tokio::test]
    async fn test_empty_tag_is_not_found() {
        let setup = Setup::new(&[("db1", "db", None)], FakeShell::new);
        let source = setup.write_local("a.txt", "a");

        let err = setup
            .engine()
            .copy(Resolver::new(&setup.registry), &[source], "cache:/tmp", true)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Resolve(ResolveError::TagEmpty(tag)) if tag == "cache"));
    }

    #[tokio::test]
    async fn test_bad_proxy_fails_only_that_group_host() {
        let setup = Setup::new(
            &[("web1", "web", None), ("web2", "web", Some("ghost"))],
            FakeShell::new,
        );
        fs::create_dir_all(setup.remote("web1", "srv")).unwrap();
        let source = setup.write_local("a.txt", "a");

        let report = setup
            .engine()
            .copy(Resolver::new(&setup.registry), &[source], "web:/srv", true)
            .await
            .unwrap();

        assert_eq!(hosts_of(report.succeeded()), vec!["web1"]);
        assert!(matches!(
            &report.outcomes[1].result,
            Err(TransferError::Resolve(ResolveError::ProxyNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_incomplete_host_fails_only_itself_in_group() {
        let tmp = TempDir::new().unwrap();
        let mut ctx = Context::new("base", tmp.path().join("base.toml"));
        ctx.defaults = Defaults {
            port: Some(22),
            password: Some("pw".into()),
            ..Default::default()
        };
        for (name, user) in [("web1", Some("ops")), ("web2", None), ("web3", Some("ops"))] {
            let mut record = HostRecord::new(name, format!("{}.internal", name));
            record.tags = vec!["web".into()];
            record.user = user.map(str::to_string);
            ctx.hosts.push(record);
        }
        let registry = Registry::single(ctx);

        let shell = Arc::new(FakeShell::new(tmp.path().join("remote")));
        for host in ["web1", "web3"] {
            fs::create_dir_all(shell.host_root(host).join("srv")).unwrap();
        }
        let source = tmp.path().join("a.txt");
        fs::write(&source, "a").unwrap();

        let engine = TransferEngine::new(
            ConnectionManager::from_shared(shell.clone(), STEP),
            Duration::from_secs(5),
        );
        let report = engine
            .copy(
                Resolver::new(&registry),
                &[source.display().to_string()],
                "web:/srv",
                true,
            )
            .await
            .unwrap();

        assert!(!report.is_success());
        assert_eq!(hosts_of(report.succeeded()), vec!["web1", "web3"]);
        assert_eq!(hosts_of(report.failed()), vec!["web2"]);
        assert!(matches!(
            &report.outcomes[1].result,
            Err(TransferError::Resolve(ResolveError::Incomplete { field: "user", .. }))
        ));
        assert!(shell.host_root("web1").join("srv/a.txt").exists());
        assert!(shell.host_root("web3").join("srv/a.txt").exists());
        assert!(!shell.events().iter().any(|e| e.contains("web2")));
    }

    #[tokio::test]
    async fn test_bad_proxy_aborts_single_target() {
        let setup = Setup::new(&[("web2", "", Some("ghost"))], FakeShell::new);
        let source = setup.write_local("a.txt", "a");

        let err = setup
            .engine()
            .copy(Resolver::new(&setup.registry), &[source], "web2:/srv", false)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::Resolve(ResolveError::ProxyNotFound { .. })));
        assert!(setup.shell.events().is_empty());
    }

    #[tokio::test]
    async fn test_missing_local_source() {
        let setup = Setup::new(&[("web1", "", None)], FakeShell::new);
        let missing = setup.local("nope.txt").display().to_string();

        let err = setup
            .engine()
            .copy(Resolver::new(&setup.registry), &[missing], "web1:/srv", false)
            .await
            .unwrap_err();
        assert!(matches!(err, TransferError::InvalidEndpoint(_)));
    }

    #[tokio::test]
    async fn test_cancelled_workers_report_cancelled() {
        let setup = Setup::new(
            &[("web1", "web", None), ("web2", "web", None)],
            FakeShell::new,
        );
        let source = setup.write_local("a.txt", "a");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = setup
            .engine()
            .with_cancellation(cancel)
            .copy(Resolver::new(&setup.registry), &[source], "web:/srv", true)
            .await
            .unwrap();

        assert_eq!(report.failed().count(), 2);
        assert!(report
            .outcomes
            .iter()
            .all(|o| matches!(o.result, Err(TransferError::Cancelled { .. }))));
        assert!(setup.shell.events().is_empty());
    }
}
