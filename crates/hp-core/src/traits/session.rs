//! Interactive shell sessions

use tokio::sync::mpsc;

use crate::error::SessionError;

/// Terminal dimensions in character cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalSize {
    pub cols: u16,
    pub rows: u16,
}

impl Default for TerminalSize {
    fn default() -> Self {
        Self { cols: 80, rows: 24 }
    }
}

/// Pseudo terminal requested for a shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PtyRequest {
    /// Value for `TERM` on the remote side
    pub term: String,
    /// Initial size
    pub size: TerminalSize,
}

impl Default for PtyRequest {
    fn default() -> Self {
        Self {
            term: "xterm-256color".to_string(),
            size: TerminalSize::default(),
        }
    }
}

/// Input sent to a remote shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellInput {
    /// Keyboard bytes
    Data(Vec<u8>),
    /// The local terminal was resized
    Resize(TerminalSize),
    /// No more input
    Eof,
}

/// Output received from a remote shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellOutput {
    /// Standard output
    Stdout(Vec<u8>),
    /// Standard error
    Stderr(Vec<u8>),
    /// The remote command exited
    Exit(u32),
}

/// Both ends of a running remote shell.
///
/// The channel itself is driven by a task owned by the transport; this handle
/// only exchanges messages with it. The shell is finished when [`read`]
/// returns `None`.
///
/// [`read`]: ShellHandle::read
#[derive(Debug)]
pub struct ShellHandle {
    input: mpsc::Sender<ShellInput>,
    output: mpsc::Receiver<ShellOutput>,
}

impl ShellHandle {
    pub fn new(input: mpsc::Sender<ShellInput>, output: mpsc::Receiver<ShellOutput>) -> Self {
        Self { input, output }
    }

    /// Send keyboard bytes
    pub async fn write(&self, data: &[u8]) -> Result<(), SessionError> {
        self.send(ShellInput::Data(data.to_vec())).await
    }

    /// Report a new terminal size
    pub async fn resize(&self, size: TerminalSize) -> Result<(), SessionError> {
        self.send(ShellInput::Resize(size)).await
    }

    /// Next output, or `None` once the shell is gone
    pub async fn read(&mut self) -> Option<ShellOutput> {
        self.output.recv().await
    }

    /// Signal end of input
    pub async fn close(&self) -> Result<(), SessionError> {
        self.send(ShellInput::Eof).await
    }

    async fn send(&self, input: ShellInput) -> Result<(), SessionError> {
        self.input
            .send(input)
            .await
            .map_err(|_| SessionError::Closed)
    }
}
