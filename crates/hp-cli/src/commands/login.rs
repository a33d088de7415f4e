//! Login command implementation

use anyhow::{bail, Context, Result};
use dialoguer::{theme::ColorfulTheme, Select};
use tokio_util::sync::CancellationToken;

use hp_core::traits::PtyRequest;
use hp_core::{ProxyChainBuilder, Registry, Resolver};

use super::Workspace;
use crate::output::{print_info, print_success, print_warning};
use crate::terminal;

/// Execute the login command
///
/// Connects through the host's proxy chain, opens a shell and attaches the
/// local terminal to it. Every hop is closed before returning.
pub async fn login_command(
    ws: &Workspace,
    name: Option<&str>,
    cancel: CancellationToken,
) -> Result<()> {
    let registry = ws.registry()?;
    let name = match name {
        Some(name) => name.to_string(),
        None => pick_host(&registry)?,
    };

    let resolver = Resolver::new(&registry);
    let target = resolver.effective(&name)?;
    let chain = ProxyChainBuilder::new(resolver)
        .with_max_hops(ws.settings.max_hops)
        .chain(&target)?;

    if chain.is_empty() {
        print_info(&format!("Connecting to {} ({})", name, target));
    } else {
        let hops: Vec<&str> = chain.iter().map(|h| h.name.as_str()).collect();
        print_info(&format!(
            "Connecting to {} ({}) via {}",
            name,
            target,
            hops.join(" -> ")
        ));
    }

    let manager = ws.connection_manager();
    let conn = tokio::select! {
        biased;
        _ = cancel.cancelled() => bail!("Interrupted while connecting to {}", name),
        result = manager.connect(&chain, &target) => result?,
    };

    print_success(&format!("Connected: {}", conn.route().join(" -> ")));

    let pty = PtyRequest {
        term: std::env::var("TERM").unwrap_or_else(|_| PtyRequest::default().term),
        size: terminal::terminal_size(),
    };
    let result = match conn.open_shell(pty).await {
        Ok(shell) => terminal::run(shell).await,
        Err(e) => Err(e).context("Failed to open a shell"),
    };
    conn.close().await;

    match result? {
        Some(0) | None => {}
        Some(code) => print_warning(&format!("Shell on {} exited with status {}", name, code)),
    }
    Ok(())
}

/// Let the user choose a host from the current context
fn pick_host(registry: &Registry) -> Result<String> {
    let ctx = registry.current();
    if ctx.hosts.is_empty() {
        bail!(
            "No hosts in context '{}'; add one with `hostpool add`",
            ctx.name()
        );
    }

    let items: Vec<String> = ctx
        .hosts
        .iter()
        .map(|h| format!("{:<12}  {}", h.name, h.address))
        .collect();
    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Host")
        .items(&items)
        .default(0)
        .interact_opt()?;

    match selection {
        Some(index) => Ok(ctx.hosts[index].name.clone()),
        None => bail!("No host selected"),
    }
}
