//! Context management commands

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context as _, Result};

use hp_core::config::{validate_name, Context, BASE_CONTEXT};

use super::Workspace;
use crate::output::{format_contexts, print_info, print_success, ContextView};

/// Execute `ctx ls`
pub fn ctx_list(ws: &Workspace) -> Result<()> {
    let current = ws.settings.current_context.as_str();
    let names = std::iter::once(BASE_CONTEXT).chain(ws.settings.contexts.keys().map(String::as_str));

    let contexts: Vec<ContextView> = names
        .map(|name| ContextView {
            name: name.to_string(),
            path: ws.settings.context_path(&ws.config_dir, name),
            current: name == current,
        })
        .collect();

    println!("{}", format_contexts(&contexts));
    Ok(())
}

/// Execute `ctx use`
pub fn ctx_use(ws: &mut Workspace, name: &str) -> Result<()> {
    if !ws.settings.has_context(name) {
        bail!("Unknown context '{}'", name);
    }

    ws.settings.current_context = name.to_string();
    ws.save()?;
    print_success(&format!("Switched to context '{}'", name));
    Ok(())
}

/// Execute `ctx add`
///
/// The context file is created empty unless it already exists, in which
/// case its hosts are kept.
pub fn ctx_add(ws: &mut Workspace, name: &str, path: Option<PathBuf>) -> Result<()> {
    validate_name(name).map_err(|reason| anyhow!("Invalid context name '{}': {}", name, reason))?;
    if ws.settings.has_context(name) {
        bail!("Context '{}' already exists", name);
    }

    let path = match path {
        Some(path) if path.is_relative() => std::env::current_dir()
            .context("Failed to resolve the current directory")?
            .join(path),
        Some(path) => path,
        None => ws.settings.context_path(&ws.config_dir, name),
    };

    let ctx = Context::load(name, &path)
        .with_context(|| format!("Failed to read context file {:?}", path))?;
    ctx.save()
        .with_context(|| format!("Failed to write context file {:?}", path))?;

    ws.settings.contexts.insert(name.to_string(), path.clone());
    ws.save()?;
    print_success(&format!(
        "Added context '{}' ({} host(s)) at {}",
        name,
        ctx.hosts.len(),
        path.display()
    ));
    Ok(())
}

/// Execute `ctx rm`
///
/// Only the registration is removed; the context file stays on disk.
pub fn ctx_remove(ws: &mut Workspace, name: &str) -> Result<()> {
    if name == BASE_CONTEXT {
        bail!("The base context cannot be removed");
    }
    let Some(path) = ws.settings.contexts.remove(name) else {
        bail!("Unknown context '{}'", name);
    };

    if ws.settings.current_context == name {
        ws.settings.current_context = BASE_CONTEXT.to_string();
        print_info("Switched back to context 'base'");
    }
    ws.save()?;
    print_success(&format!(
        "Removed context '{}' (file kept at {})",
        name,
        path.display()
    ));
    Ok(())
}
