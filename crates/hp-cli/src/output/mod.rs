//! Output formatting utilities for the CLI
//!
//! Host tables and detail views, transfer reports, and colored status
//! messages.

use std::path::PathBuf;

use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use hp_core::config::HostRecord;
use hp_core::TransferReport;

/// A host as shown by `ls` and `show`.
///
/// Secrets are never included; only which authentication factors are set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostView {
    pub name: String,
    pub context: String,
    pub address: String,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub tags: Vec<String>,
    pub proxy: Option<String>,
    pub auth: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<u64>,
}

impl HostView {
    /// View of a record that already has its context defaults applied
    pub fn new(context: &str, host: &HostRecord) -> Self {
        Self {
            name: host.name.clone(),
            context: context.to_string(),
            address: host.address.clone(),
            port: host.port,
            user: host.user.clone(),
            tags: host.tags.clone(),
            proxy: host.proxy.clone(),
            auth: auth_summary(host),
            private_key: host.private_key.clone(),
            keep_alive: host.keep_alive,
        }
    }
}

/// Which authentication factors a host has
fn auth_summary(host: &HostRecord) -> String {
    let set = |v: &Option<String>| v.as_deref().map_or(false, |s| !s.is_empty());
    match (set(&host.private_key), set(&host.password)) {
        (true, true) => "key+password",
        (true, false) => "key",
        (false, true) => "password",
        (false, false) => "-",
    }
    .to_string()
}

/// Format a list of hosts as a table
pub fn format_hosts(hosts: &[HostView]) -> String {
    if hosts.is_empty() {
        return "No hosts".to_string();
    }

    #[derive(Tabled)]
    struct HostRow {
        #[tabled(rename = "NAME")]
        name: String,
        #[tabled(rename = "CONTEXT")]
        context: String,
        #[tabled(rename = "ADDRESS")]
        address: String,
        #[tabled(rename = "USER")]
        user: String,
        #[tabled(rename = "TAGS")]
        tags: String,
        #[tabled(rename = "PROXY")]
        proxy: String,
        #[tabled(rename = "AUTH")]
        auth: String,
    }

    let rows: Vec<HostRow> = hosts
        .iter()
        .map(|h| HostRow {
            name: h.name.clone(),
            context: h.context.clone(),
            address: match h.port {
                Some(port) => format!("{}:{}", h.address, port),
                None => h.address.clone(),
            },
            user: or_dash(h.user.as_deref()),
            tags: if h.tags.is_empty() {
                "-".to_string()
            } else {
                h.tags.join(",")
            },
            proxy: or_dash(h.proxy.as_deref()),
            auth: h.auth.clone(),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format one host as `key: value` lines
pub fn format_host_detail(host: &HostView) -> String {
    let mut output = String::new();

    output.push_str(&format!("Name:       {}\n", host.name));
    output.push_str(&format!("Context:    {}\n", host.context));
    output.push_str(&format!("Address:    {}\n", host.address));
    output.push_str(&format!(
        "Port:       {}\n",
        host.port.map_or_else(|| "-".to_string(), |p| p.to_string())
    ));
    output.push_str(&format!("User:       {}\n", or_dash(host.user.as_deref())));
    output.push_str(&format!(
        "Tags:       {}\n",
        if host.tags.is_empty() {
            "-".to_string()
        } else {
            host.tags.join(", ")
        }
    ));
    output.push_str(&format!("Auth:       {}\n", host.auth));
    output.push_str(&format!(
        "Key:        {}\n",
        or_dash(host.private_key.as_deref())
    ));
    output.push_str(&format!(
        "Keep-alive: {}\n",
        host.keep_alive
            .map_or_else(|| "-".to_string(), |s| format!("{}s", s))
    ));
    output.push_str(&format!("Proxy:      {}\n", or_dash(host.proxy.as_deref())));

    output
}

/// A registered context as shown by `ctx ls`
#[derive(Debug, Clone)]
pub struct ContextView {
    pub name: String,
    pub path: PathBuf,
    pub current: bool,
}

/// Format the registered contexts, marking the current one
pub fn format_contexts(contexts: &[ContextView]) -> String {
    #[derive(Tabled)]
    struct ContextRow {
        #[tabled(rename = "")]
        marker: &'static str,
        #[tabled(rename = "CONTEXT")]
        name: String,
        #[tabled(rename = "FILE")]
        path: String,
    }

    let rows: Vec<ContextRow> = contexts
        .iter()
        .map(|c| ContextRow {
            marker: if c.current { "*" } else { "" },
            name: c.name.clone(),
            path: c.path.display().to_string(),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format the per-host results of a copy
pub fn format_report(report: &TransferReport) -> String {
    #[derive(Tabled)]
    struct OutcomeRow {
        #[tabled(rename = "HOST")]
        host: String,
        #[tabled(rename = "STATUS")]
        status: String,
        #[tabled(rename = "FILES")]
        files: String,
        #[tabled(rename = "SIZE")]
        size: String,
    }

    let rows: Vec<OutcomeRow> = report
        .outcomes
        .iter()
        .map(|o| match &o.result {
            Ok(stats) => OutcomeRow {
                host: o.host.clone(),
                status: "ok".to_string(),
                files: stats.files.to_string(),
                size: format_bytes(stats.bytes),
            },
            Err(e) => OutcomeRow {
                host: o.host.clone(),
                status: e.to_string(),
                files: "-".to_string(),
                size: "-".to_string(),
            },
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Format a byte count in human-readable form
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

fn or_dash(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => "-".to_string(),
    }
}

/// Print a success message in green with a checkmark prefix
///
/// Outputs to stdout with green coloring for positive feedback to the user.
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix
///
/// Outputs to stderr with red coloring for error feedback to the user.
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a warning message in yellow with a warning symbol prefix
pub fn print_warning(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("⚠ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an informational message in cyan with an info symbol prefix
pub fn print_info(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}
