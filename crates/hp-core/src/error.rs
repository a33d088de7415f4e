//! Core error types for hostpool

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Top-level error type for the hostpool ecosystem
#[derive(Error, Debug)]
pub enum HpError {
    /// Registry error
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Resolution error
    #[error("Resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// Connection error
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),

    /// Transfer error
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// Session error
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Host registry errors
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No host matched the name or pattern
    #[error("Host not found: {0}")]
    NotFound(String),

    /// A host with this name already exists
    #[error("Host name already exists: {0}")]
    DuplicateName(String),

    /// The host name is empty or too long
    #[error("Invalid host name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    /// The in-memory registry changed but could not be written back
    #[error("Failed to persist registry: {0}")]
    Persist(#[from] ConfigError),
}

/// Errors raised while turning names and tags into effective hosts
#[derive(Error, Debug)]
pub enum ResolveError {
    /// No host with this name
    #[error("Host not found: {0}")]
    NotFound(String),

    /// No host carries this tag
    #[error("No hosts tagged {0:?}")]
    TagEmpty(String),

    /// A proxy reference names a host that does not exist
    #[error("Proxy {proxy:?} referenced by {host:?} not found")]
    ProxyNotFound { host: String, proxy: String },

    /// The proxy references form a loop
    #[error("Proxy cycle detected: {}", chain.join(" -> "))]
    CycleDetected { chain: Vec<String> },

    /// The proxy chain exceeds the configured maximum
    #[error("Proxy chain for {host:?} exceeds {max} hops")]
    ChainTooLong { host: String, max: usize },

    /// A required connection field is missing after merging defaults
    #[error("Host {host:?} has no {field} after applying defaults")]
    Incomplete { host: String, field: &'static str },
}

/// Step of the connection protocol that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectStage {
    /// Opening a TCP connection to the first hop
    Dial,
    /// Opening a direct-tcpip channel through the previous hop
    Tunnel,
    /// SSH handshake and user authentication
    Authenticate,
}

impl fmt::Display for ConnectStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectStage::Dial => write!(f, "dial"),
            ConnectStage::Tunnel => write!(f, "tunnel"),
            ConnectStage::Authenticate => write!(f, "authenticate"),
        }
    }
}

/// Why a single connection step failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The step did not complete in time
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The server rejected every offered credential
    #[error("authentication rejected")]
    AuthRejected,

    /// The address could not be reached
    #[error("unreachable: {0}")]
    Unreachable(String),

    /// The private key could not be loaded
    #[error("key error: {0}")]
    Key(String),

    /// SSH protocol failure
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// A hop in the connection chain could not be established
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("hop {position} ({hop}) failed to {stage}: {cause}")]
pub struct ConnectionError {
    /// Name of the host that failed
    pub hop: String,
    /// Zero-based position in the chain; the target is last
    pub position: usize,
    /// Step that failed
    pub stage: ConnectStage,
    /// Underlying cause
    pub cause: FailureCause,
}

/// Errors on an established session
#[derive(Error, Debug)]
pub enum SessionError {
    /// A channel could not be opened or a request on it was refused
    #[error("Channel error: {0}")]
    Channel(String),

    /// A remote file operation failed
    #[error("Remote error on {path}: {message}")]
    Remote { path: String, message: String },

    /// Local I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The session or channel is already closed
    #[error("Session closed")]
    Closed,
}

/// Errors from the copy engine
#[derive(Error, Debug)]
pub enum TransferError {
    /// The endpoint arguments do not describe a valid copy
    #[error("Invalid copy endpoints: {0}")]
    InvalidEndpoint(String),

    /// A remote identifier could not be resolved
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The session to a host could not be established
    #[error("{host}: {source}")]
    Connection {
        host: String,
        #[source]
        source: ConnectionError,
    },

    /// The data transfer itself failed
    #[error("{host}: transfer failed: {cause}")]
    Failed { host: String, cause: String },

    /// The transfer was interrupted before it finished
    #[error("{host}: transfer cancelled")]
    Cancelled { host: String },
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Filesystem error while reading or writing a config file
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
