//! Turns names and tags into effective hosts
//!
//! Every record is merged against the defaults of the context that owns it.
//! Records are never merged across contexts, and when the current context is
//! the base context each record is merged once.

use crate::config::{Context, Defaults, HostRecord};
use crate::error::ResolveError;
use crate::registry::Registry;
use crate::types::EffectiveHost;

/// Read-only resolution over a [`Registry`]
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
    registry: &'a Registry,
}

impl<'a> Resolver<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        Self { registry }
    }

    /// The registry being resolved against
    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Apply `defaults` to a copy of `record`
    pub fn merge(defaults: &Defaults, record: &HostRecord) -> HostRecord {
        let mut merged = record.clone();
        merged.merge_defaults(defaults);
        merged
    }

    /// Merge a record against its own context and validate the result
    pub fn effective_in(context: &Context, record: &HostRecord) -> Result<EffectiveHost, ResolveError> {
        EffectiveHost::from_merged(&Self::merge(&context.defaults, record))
    }

    /// Resolve a single host by name
    pub fn effective(&self, name: &str) -> Result<EffectiveHost, ResolveError> {
        let (context, record) = self
            .registry
            .find_entry(name)
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))?;
        Self::effective_in(context, record)
    }

    /// Resolve every host carrying `tag` independently.
    ///
    /// Each name is paired with its own result so that one incomplete host
    /// does not hide the others. Empty when no host carries the tag.
    pub fn by_tag(&self, tag: &str) -> Vec<(String, Result<EffectiveHost, ResolveError>)> {
        self.registry
            .entries()
            .filter(|(_, record)| record.has_tag(tag))
            .map(|(context, record)| (record.name.clone(), Self::effective_in(context, record)))
            .collect()
    }

    /// Resolve the identifier of a remote endpoint.
    ///
    /// Without `group` the token is a host name and exactly one host comes
    /// back; any resolution error is returned directly. With `group` it is a
    /// tag, the result may be empty and errors are reported per host.
    pub fn resolve_target(
        &self,
        token: &str,
        group: bool,
    ) -> Result<Vec<(String, Result<EffectiveHost, ResolveError>)>, ResolveError> {
        if group {
            let hosts = self.by_tag(token);
            tracing::debug!("Tag {} resolved to {} host(s)", token, hosts.len());
            Ok(hosts)
        } else {
            let host = self.effective(token)?;
            Ok(vec![(host.name.clone(), Ok(host))])
        }
    }
}
