//! hp-core: Host registry, proxy chains, connections and transfers for hostpool
//!
//! This crate holds everything that does not touch the network directly:
//! the layered host registry and its configuration files, resolution of
//! names and tags into effective hosts, proxy chain construction, and the
//! connection and transfer engines that drive a [`traits::RemoteShell`].

pub mod chain;
pub mod config;
pub mod connection;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod traits;
pub mod transfer;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use chain::ProxyChainBuilder;
pub use connection::{Connection, ConnectionManager};
pub use error::HpError;
pub use registry::Registry;
pub use resolver::Resolver;
pub use transfer::{TransferEngine, TransferReport};
pub use types::{AuthFactors, EffectiveHost};
