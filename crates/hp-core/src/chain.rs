//! Proxy chain construction
//!
//! A host may name another host it is reached through. Following those
//! references yields the hops that must be connected, in order, before the
//! target itself.

use crate::config::DEFAULT_MAX_HOPS;
use crate::error::ResolveError;
use crate::resolver::Resolver;
use crate::types::EffectiveHost;

/// Builds hop lists by walking proxy references
#[derive(Debug, Clone, Copy)]
pub struct ProxyChainBuilder<'a> {
    resolver: Resolver<'a>,
    max_hops: usize,
}

impl<'a> ProxyChainBuilder<'a> {
    pub fn new(resolver: Resolver<'a>) -> Self {
        Self {
            resolver,
            max_hops: DEFAULT_MAX_HOPS,
        }
    }

    /// Set the maximum number of intermediate hops
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Hops needed to reach `target`, outermost (dialed first) to innermost.
    ///
    /// The target itself is not part of the result; an empty list means the
    /// target is dialed directly.
    pub fn chain(&self, target: &EffectiveHost) -> Result<Vec<EffectiveHost>, ResolveError> {
        let mut hops: Vec<EffectiveHost> = Vec::new();
        let mut visited = vec![target.name.clone()];
        let mut referrer = target.name.clone();
        let mut next = target.proxy.clone();

        while let Some(proxy) = next {
            if visited.contains(&proxy) {
                visited.push(proxy);
                return Err(ResolveError::CycleDetected { chain: visited });
            }
            if hops.len() >= self.max_hops {
                return Err(ResolveError::ChainTooLong {
                    host: target.name.clone(),
                    max: self.max_hops,
                });
            }

            let hop = match self.resolver.effective(&proxy) {
                Ok(hop) => hop,
                Err(ResolveError::NotFound(_)) => {
                    return Err(ResolveError::ProxyNotFound {
                        host: referrer,
                        proxy,
                    })
                }
                Err(e) => return Err(e),
            };

            tracing::debug!("{} is reached through {}", referrer, hop.name);
            visited.push(proxy);
            referrer = hop.name.clone();
            next = hop.proxy.clone();
            hops.push(hop);
        }

        // Collected innermost first
        hops.reverse();
        Ok(hops)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Context, Defaults, HostRecord};
    use crate::registry::Registry;
    use tempfile::TempDir;

    /// Registry of `(name, proxy)` pairs with complete defaults
    fn registry(dir: &TempDir, hosts: &[(&str, Option<&str>)]) -> Registry {
        let mut ctx = Context::new("base", dir.path().join("base.toml"));
        ctx.defaults = Defaults {
            user: Some("ops".into()),
            port: Some(22),
            password: Some("pw".into()),
            ..Default::default()
        };
        for (name, proxy) in hosts {
            let mut record = HostRecord::new(*name, format!("{}.internal", name));
            record.proxy = proxy.map(str::to_string);
            ctx.hosts.push(record);
        }
        ctx.sort_hosts();
        Registry::single(ctx)
    }

    fn names(hops: &[EffectiveHost]) -> Vec<&str> {
        hops.iter().map(|h| h.name.as_str()).collect()
    }

    #[test]
    fn test_direct_host_has_empty_chain() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir, &[("db1", None)]);
        let resolver = Resolver::new(&registry);
        let target = resolver.effective("db1").unwrap();

        assert!(ProxyChainBuilder::new(resolver).chain(&target).unwrap().is_empty());
    }

    #[test]
    fn test_chain_is_outermost_first() {
        let dir = TempDir::new().unwrap();
        let registry = registry(
            &dir,
            &[("db1", Some("inner")), ("inner", Some("edge")), ("edge", None)],
        );
        let resolver = Resolver::new(&registry);
        let target = resolver.effective("db1").unwrap();

        let hops = ProxyChainBuilder::new(resolver).chain(&target).unwrap();
        assert_eq!(names(&hops), vec!["edge", "inner"]);
    }

    #[test]
    fn test_cycle_detected() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir, &[("a", Some("b")), ("b", Some("c")), ("c", Some("b"))]);
        let resolver = Resolver::new(&registry);
        let target = resolver.effective("a").unwrap();

        let err = ProxyChainBuilder::new(resolver).chain(&target).unwrap_err();
        match err {
            ResolveError::CycleDetected { chain } => assert_eq!(chain, vec!["a", "b", "c", "b"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_cycle_through_target() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir, &[("a", Some("b")), ("b", Some("a"))]);
        let resolver = Resolver::new(&registry);
        let target = resolver.effective("a").unwrap();

        assert!(matches!(
            ProxyChainBuilder::new(resolver).chain(&target),
            Err(ResolveError::CycleDetected { .. })
        ));
    }

    #[test]
    fn test_self_proxy_is_a_cycle() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir, &[("a", Some("a"))]);
        let resolver = Resolver::new(&registry);
        let target = resolver.effective("a").unwrap();

        assert!(matches!(
            ProxyChainBuilder::new(resolver).chain(&target),
            Err(ResolveError::CycleDetected { chain }) if chain == vec!["a", "a"]
        ));
    }

    #[test]
    fn test_missing_proxy() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir, &[("db1", Some("gone"))]);
        let resolver = Resolver::new(&registry);
        let target = resolver.effective("db1").unwrap();

        let err = ProxyChainBuilder::new(resolver).chain(&target).unwrap_err();
        assert!(matches!(
            err,
            ResolveError::ProxyNotFound { ref host, ref proxy } if host == "db1" && proxy == "gone"
        ));
    }

    #[test]
    fn test_chain_bound() {
        let dir = TempDir::new().unwrap();
        let registry = registry(
            &dir,
            &[
                ("h0", Some("h1")),
                ("h1", Some("h2")),
                ("h2", Some("h3")),
                ("h3", None),
            ],
        );
        let resolver = Resolver::new(&registry);
        let target = resolver.effective("h0").unwrap();

        let builder = ProxyChainBuilder::new(resolver);
        assert_eq!(names(&builder.with_max_hops(3).chain(&target).unwrap()), vec!["h3", "h2", "h1"]);
        assert!(matches!(
            builder.with_max_hops(2).chain(&target),
            Err(ResolveError::ChainTooLong { max: 2, .. })
        ));
    }
}
