//! Connection traits

use async_trait::async_trait;

use super::session::{PtyRequest, ShellHandle};
use super::transfer::FileTransfer;
use crate::error::{FailureCause, SessionError};
use crate::types::EffectiveHost;

/// Primitive SSH operations used to build a chain of hops.
///
/// Implementations do not apply timeouts; the connection manager bounds
/// every call.
#[async_trait]
pub trait RemoteShell: Send + Sync + 'static {
    /// Unauthenticated byte stream to a host
    type Link: Send;

    /// Authenticated session on a host
    type Session: HopSession;

    /// Open a direct connection to `host`
    async fn dial(&self, host: &EffectiveHost) -> Result<Self::Link, FailureCause>;

    /// Open a forwarded connection to `host` through an established session
    async fn tunnel(&self, via: &Self::Session, host: &EffectiveHost) -> Result<Self::Link, FailureCause>;

    /// Run the SSH handshake over `link` and authenticate as the host's user
    async fn authenticate(&self, link: Self::Link, host: &EffectiveHost) -> Result<Self::Session, FailureCause>;
}

/// An authenticated session on one hop
#[async_trait]
pub trait HopSession: Send + Sync + 'static {
    /// File transfer channel type
    type Transfer: FileTransfer;

    /// Open an interactive shell with a pseudo terminal
    async fn open_shell(&self, pty: PtyRequest) -> Result<ShellHandle, SessionError>;

    /// Open a file transfer channel
    async fn open_transfer(&self) -> Result<Self::Transfer, SessionError>;

    /// Disconnect
    async fn close(&self) -> Result<(), SessionError>;
}
