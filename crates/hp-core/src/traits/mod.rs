//! Core trait definitions

mod connection;
mod session;
mod transfer;

pub use connection::{HopSession, RemoteShell};
pub use session::{PtyRequest, ShellHandle, ShellInput, ShellOutput, TerminalSize};
pub use transfer::{FileTransfer, RemoteKind, TransferStats};
