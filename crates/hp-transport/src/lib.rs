//! hp-transport: SSH transport for hostpool
//!
//! Implements the connection traits from `hp-core` on top of russh:
//! direct dialing, `direct-tcpip` tunneling through earlier hops, key and
//! password authentication, PTY shells, and SFTP file transfer.

pub mod error;
mod handler;
mod session;
mod sftp;
mod shell;

pub use error::TransportError;
pub use handler::ClientHandler;
pub use session::SshSession;
pub use sftp::SftpTransfer;
pub use shell::{Link, RusshShell};
