//! Host registry commands: add, edit, del, ls, show

use anyhow::{bail, Context, Result};
use clap::Args;

use hp_core::config::HostRecord;
use hp_core::error::RegistryError;
use hp_core::Registry;

use super::Workspace;
use crate::output::{format_host_detail, format_hosts, print_success, HostView};

/// Host fields shared by `add` and `edit`.
///
/// On `edit`, passing an empty value clears the field.
#[derive(Debug, Clone, Default, Args)]
pub struct HostArgs {
    /// SSH user
    #[arg(short, long)]
    pub user: Option<String>,

    /// SSH port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Tags, comma separated
    #[arg(short, long, value_delimiter = ',')]
    pub tags: Option<Vec<String>>,

    /// Password for password authentication
    #[arg(long)]
    pub password: Option<String>,

    /// Path to a private key
    #[arg(short, long)]
    pub key: Option<String>,

    /// Passphrase for the private key
    #[arg(long)]
    pub passphrase: Option<String>,

    /// Host to reach this one through
    #[arg(long)]
    pub proxy: Option<String>,

    /// Keep-alive interval in seconds
    #[arg(long, value_name = "SECS")]
    pub keep_alive: Option<u64>,
}

impl HostArgs {
    /// Overwrite the fields that were given
    pub fn apply(self, record: &mut HostRecord) {
        set(&mut record.user, self.user);
        set(&mut record.password, self.password);
        set(&mut record.private_key, self.key);
        set(&mut record.private_key_password, self.passphrase);
        set(&mut record.proxy, self.proxy);
        if let Some(port) = self.port {
            record.port = (port != 0).then_some(port);
        }
        if let Some(secs) = self.keep_alive {
            record.keep_alive = (secs != 0).then_some(secs);
        }
        if let Some(tags) = self.tags {
            let mut cleaned: Vec<String> = Vec::new();
            for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
                if !cleaned.iter().any(|t| t == tag) {
                    cleaned.push(tag.to_string());
                }
            }
            record.tags = cleaned;
        }
    }
}

fn set(field: &mut Option<String>, value: Option<String>) {
    if let Some(value) = value {
        *field = (!value.is_empty()).then_some(value);
    }
}

/// A host may only name an existing host, other than itself, as its proxy
fn check_proxy(registry: &Registry, record: &HostRecord) -> Result<()> {
    let Some(proxy) = &record.proxy else {
        return Ok(());
    };
    if *proxy == record.name {
        bail!("Host '{}' cannot be its own proxy", record.name);
    }
    if registry.find_entry(proxy).is_none() {
        bail!("Proxy '{}' is not a known host", proxy);
    }
    Ok(())
}

/// Execute the add command
pub fn add_command(ws: &Workspace, name: &str, address: &str, args: HostArgs) -> Result<()> {
    let mut registry = ws.registry()?;

    let mut record = HostRecord::new(name, address);
    args.apply(&mut record);
    check_proxy(&registry, &record)?;

    registry.add(record)?;
    print_success(&format!(
        "Added {} to context '{}'",
        name,
        registry.current().name()
    ));
    Ok(())
}

/// Execute the edit command
pub fn edit_command(
    ws: &Workspace,
    name: &str,
    address: Option<String>,
    rename: Option<String>,
    args: HostArgs,
) -> Result<()> {
    let mut registry = ws.registry()?;

    let mut record = registry
        .current()
        .hosts
        .iter()
        .find(|h| h.name == name)
        .cloned()
        .ok_or_else(|| RegistryError::NotFound(name.to_string()))
        .with_context(|| {
            format!(
                "Only hosts in context '{}' can be edited",
                registry.current().name()
            )
        })?;

    if let Some(address) = address.filter(|a| !a.is_empty()) {
        record.address = address;
    }
    if let Some(rename) = rename {
        record.name = rename;
    }
    args.apply(&mut record);
    check_proxy(&registry, &record)?;

    let new_name = record.name.clone();
    registry.edit(name, record)?;
    if new_name == name {
        print_success(&format!("Updated {}", name));
    } else {
        print_success(&format!("Updated {} (now {})", name, new_name));
    }
    Ok(())
}

/// Execute the del command
pub fn delete_command(ws: &Workspace, patterns: &[String]) -> Result<()> {
    let mut registry = ws.registry()?;
    let removed = registry.delete(patterns)?;
    print_success(&format!(
        "Deleted {} host(s): {}",
        removed.len(),
        removed.join(", ")
    ));
    Ok(())
}

/// Execute the ls command
pub fn list_command(ws: &Workspace, tag: Option<&str>, json: bool) -> Result<()> {
    let registry = ws.registry()?;

    let hosts: Vec<HostView> = registry
        .list()
        .into_iter()
        .filter(|(_, host)| tag.map_or(true, |t| host.has_tag(t)))
        .map(|(ctx, host)| HostView::new(ctx.name(), &host))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&hosts)?);
    } else {
        println!("{}", format_hosts(&hosts));
    }
    Ok(())
}

/// Execute the show command
pub fn show_command(ws: &Workspace, name: &str) -> Result<()> {
    let registry = ws.registry()?;
    let (ctx, host) = registry.detail(name)?;

    let view = HostView::new(ctx.name(), &host);
    print!("{}", format_host_detail(&view));
    Ok(())
}
