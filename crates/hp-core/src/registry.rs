//! Host registry over the base and current contexts
//!
//! Lookups see the merged view of both contexts with the current context
//! taking precedence. Mutations only ever touch the current context and
//! rewrite its file immediately.

use std::path::Path;

use crate::config::{validate_name, Context, HostRecord, Settings, BASE_CONTEXT};
use crate::error::{ConfigError, RegistryError};

/// The two active contexts
#[derive(Debug, Clone)]
pub struct Registry {
    base: Context,
    /// `None` when the current context is the base context
    current: Option<Context>,
}

impl Registry {
    /// Build a registry from a base and a current context.
    ///
    /// When both are backed by the same file the current context is
    /// dropped so that every record is seen (and merged) exactly once.
    pub fn new(base: Context, current: Context) -> Self {
        let current = if current.same_location(&base) {
            None
        } else {
            Some(current)
        };
        Self { base, current }
    }

    /// Registry where the base context is also the working context
    pub fn single(base: Context) -> Self {
        Self {
            base,
            current: None,
        }
    }

    /// Load the contexts named by `settings` from `config_dir`
    pub fn open(config_dir: &Path, settings: &Settings) -> Result<Self, ConfigError> {
        let base = Context::load(
            BASE_CONTEXT,
            settings.context_path(config_dir, BASE_CONTEXT),
        )?;
        if settings.current_context == BASE_CONTEXT {
            return Ok(Self::single(base));
        }

        let current = Context::load(
            settings.current_context.as_str(),
            settings.context_path(config_dir, &settings.current_context),
        )?;
        tracing::debug!(
            "Loaded contexts base={:?} current={:?}",
            base.path(),
            current.path()
        );
        Ok(Self::new(base, current))
    }

    /// The base context
    pub fn base(&self) -> &Context {
        &self.base
    }

    /// The working context (which may be the base context)
    pub fn current(&self) -> &Context {
        self.current.as_ref().unwrap_or(&self.base)
    }

    fn current_mut(&mut self) -> &mut Context {
        self.current.as_mut().unwrap_or(&mut self.base)
    }

    /// Loaded contexts in lookup order: current first, then base
    pub fn contexts(&self) -> impl Iterator<Item = &Context> {
        self.current.iter().chain(std::iter::once(&self.base))
    }

    /// Every record paired with its context, in lookup order
    pub fn entries(&self) -> impl Iterator<Item = (&Context, &HostRecord)> {
        self.contexts()
            .flat_map(|ctx| ctx.hosts.iter().map(move |host| (ctx, host)))
    }

    /// Find a host by exact name
    pub fn find_by_name(&self, name: &str) -> Result<&HostRecord, RegistryError> {
        self.find_entry(name)
            .map(|(_, host)| host)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Find a host and the context that owns it
    pub fn find_entry(&self, name: &str) -> Option<(&Context, &HostRecord)> {
        self.entries().find(|(_, host)| host.name == name)
    }

    /// All hosts carrying `tag`, from both contexts
    pub fn find_by_tag(&self, tag: &str) -> Vec<&HostRecord> {
        self.entries()
            .map(|(_, host)| host)
            .filter(|host| host.has_tag(tag))
            .collect()
    }

    /// Add a host to the current context and persist it
    pub fn add(&mut self, record: HostRecord) -> Result<(), RegistryError> {
        validate_name(&record.name).map_err(|reason| RegistryError::InvalidName {
            name: record.name.clone(),
            reason,
        })?;
        if self.find_entry(&record.name).is_some() {
            return Err(RegistryError::DuplicateName(record.name));
        }

        tracing::info!("Adding host {} to context {}", record.name, self.current().name());
        let ctx = self.current_mut();
        ctx.register_tags(&record.tags);
        ctx.hosts.push(record);
        ctx.sort_hosts();
        ctx.save()?;
        Ok(())
    }

    /// Replace the current-context host called `name` and persist it
    pub fn edit(&mut self, name: &str, record: HostRecord) -> Result<(), RegistryError> {
        let index = self
            .current()
            .hosts
            .iter()
            .position(|h| h.name == name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;

        if record.name != name {
            validate_name(&record.name).map_err(|reason| RegistryError::InvalidName {
                name: record.name.clone(),
                reason,
            })?;
            if self.find_entry(&record.name).is_some() {
                return Err(RegistryError::DuplicateName(record.name));
            }
        }

        let ctx = self.current_mut();
        ctx.register_tags(&record.tags);
        ctx.hosts[index] = record;
        ctx.sort_hosts();
        ctx.save()?;
        Ok(())
    }

    /// Delete current-context hosts matching any of `patterns`.
    ///
    /// Each pattern is a glob; a pattern that is not a valid glob is
    /// compared case-insensitively against whole names instead. Returns
    /// the removed names in list order.
    pub fn delete<S: AsRef<str>>(&mut self, patterns: &[S]) -> Result<Vec<String>, RegistryError> {
        let ctx = self.current_mut();
        let mut marked = vec![false; ctx.hosts.len()];

        for pattern in patterns.iter().map(AsRef::as_ref) {
            let glob = compile_pattern(pattern);
            for (i, host) in ctx.hosts.iter().enumerate() {
                let hit = match &glob {
                    Ok(glob) => glob.matches(&host.name),
                    Err(_) => host.name.to_lowercase() == pattern.to_lowercase(),
                };
                if hit {
                    marked[i] = true;
                }
            }
        }

        if !marked.contains(&true) {
            let wanted: Vec<&str> = patterns.iter().map(AsRef::as_ref).collect();
            return Err(RegistryError::NotFound(wanted.join(" ")));
        }

        let mut removed = Vec::new();
        let hosts = std::mem::take(&mut ctx.hosts);
        for (host, delete) in hosts.into_iter().zip(marked) {
            if delete {
                removed.push(host.name);
            } else {
                ctx.hosts.push(host);
            }
        }
        ctx.sort_hosts();

        tracing::info!("Deleted {} host(s) from context {}", removed.len(), ctx.name());
        ctx.save()?;
        Ok(removed)
    }

    /// Every record with its owning context's defaults applied, in lookup order
    pub fn list(&self) -> Vec<(&Context, HostRecord)> {
        self.entries()
            .map(|(ctx, host)| {
                let mut host = host.clone();
                host.merge_defaults(&ctx.defaults);
                (ctx, host)
            })
            .collect()
    }

    /// A single record with its context defaults applied, and that context
    pub fn detail(&self, name: &str) -> Result<(&Context, HostRecord), RegistryError> {
        let (ctx, host) = self
            .find_entry(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))?;
        let mut host = host.clone();
        host.merge_defaults(&ctx.defaults);
        Ok((ctx, host))
    }
}

/// Compile a delete pattern. A run of `*` matches the same as a single one.
fn compile_pattern(pattern: &str) -> Result<glob::Pattern, glob::PatternError> {
    let mut collapsed = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        if c == '*' && collapsed.ends_with('*') {
            continue;
        }
        collapsed.push(c);
    }
    glob::Pattern::new(&collapsed)
}
