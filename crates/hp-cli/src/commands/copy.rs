//! Copy command implementation

use anyhow::{anyhow, bail, Context, Result};
use tokio_util::sync::CancellationToken;

use hp_core::{Resolver, TransferEngine};

use super::Workspace;
use crate::output::{format_bytes, format_report, print_success};

/// Execute the cp command
///
/// The last path is the destination. With `group` the remote identifier is
/// a tag and every tagged host is copied to or from concurrently.
pub async fn copy_command(
    ws: &Workspace,
    paths: &[String],
    group: bool,
    cancel: CancellationToken,
) -> Result<()> {
    let (destination, sources) = paths
        .split_last()
        .context("Expected at least one source and a destination")?;

    let registry = ws.registry()?;
    let engine = TransferEngine::new(ws.connection_manager(), ws.settings.transfer_timeout)
        .with_max_hops(ws.settings.max_hops)
        .with_cancellation(cancel);

    let report = engine
        .copy(Resolver::new(&registry), sources, destination, group)
        .await?;

    let hosts = report.outcomes.len();
    if hosts > 1 {
        println!("{}", format_report(&report));
    }

    let failed = report.failed().count();
    if failed == 0 {
        let totals = report.totals();
        print_success(&format!(
            "Copied {} file(s), {} ({} host(s))",
            totals.files,
            format_bytes(totals.bytes),
            hosts
        ));
        return Ok(());
    }

    if hosts == 1 {
        if let Some(Err(e)) = report.outcomes.into_iter().next().map(|o| o.result) {
            return Err(anyhow!(e));
        }
    }
    bail!("{} of {} host(s) failed", failed, hosts)
}
