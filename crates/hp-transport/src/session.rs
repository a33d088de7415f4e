//! Authenticated hop sessions and interactive shells

use async_trait::async_trait;
use russh::client::{Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect};
use tokio::sync::mpsc;

use hp_core::error::SessionError;
use hp_core::traits::{HopSession, PtyRequest, ShellHandle, ShellInput, ShellOutput};

use crate::error::TransportError;
use crate::handler::ClientHandler;
use crate::sftp::SftpTransfer;

/// Buffered messages between the terminal and the shell channel
const SHELL_CHANNEL_CAPACITY: usize = 256;

/// One authenticated SSH session
pub struct SshSession {
    name: String,
    handle: Handle<ClientHandler>,
}

impl SshSession {
    pub(crate) fn new(name: String, handle: Handle<ClientHandler>) -> Self {
        Self { name, handle }
    }

    /// Name of the host this session is on
    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn handle(&self) -> &Handle<ClientHandler> {
        &self.handle
    }
}

#[async_trait]
impl HopSession for SshSession {
    type Transfer = SftpTransfer;

    async fn open_shell(&self, pty: PtyRequest) -> Result<ShellHandle, SessionError> {
        let channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(TransportError::from)?;

        channel
            .request_pty(
                false,
                &pty.term,
                u32::from(pty.size.cols),
                u32::from(pty.size.rows),
                0,
                0,
                &[],
            )
            .await
            .map_err(TransportError::from)?;
        channel
            .request_shell(false)
            .await
            .map_err(TransportError::from)?;

        tracing::info!("Interactive shell started on {}", self.name);
        Ok(spawn_shell_pump(channel, self.name.clone()))
    }

    async fn open_transfer(&self) -> Result<SftpTransfer, SessionError> {
        Ok(SftpTransfer::open(&self.handle, &self.name).await?)
    }

    async fn close(&self) -> Result<(), SessionError> {
        self.handle
            .disconnect(Disconnect::ByApplication, "", "en")
            .await
            .map_err(TransportError::from)?;
        Ok(())
    }
}

/// Drive a shell channel from a task and hand back the message ends
fn spawn_shell_pump(mut channel: Channel<Msg>, host: String) -> ShellHandle {
    let (input_tx, mut input_rx) = mpsc::channel::<ShellInput>(SHELL_CHANNEL_CAPACITY);
    let (output_tx, output_rx) = mpsc::channel::<ShellOutput>(SHELL_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let mut input_open = true;

        loop {
            tokio::select! {
                input = input_rx.recv(), if input_open => match input {
                    Some(ShellInput::Data(data)) => {
                        if let Err(e) = channel.data(&data[..]).await {
                            tracing::warn!("Failed to write to shell on {}: {}", host, e);
                            break;
                        }
                    }
                    Some(ShellInput::Resize(size)) => {
                        if let Err(e) = channel
                            .window_change(u32::from(size.cols), u32::from(size.rows), 0, 0)
                            .await
                        {
                            tracing::debug!("Failed to resize shell on {}: {}", host, e);
                        }
                    }
                    Some(ShellInput::Eof) | None => {
                        input_open = false;
                        let _ = channel.eof().await;
                    }
                },

                msg = channel.wait() => match msg {
                    Some(ChannelMsg::Data { data }) => {
                        if output_tx.send(ShellOutput::Stdout(data.to_vec())).await.is_err() {
                            break;
                        }
                    }
                    Some(ChannelMsg::ExtendedData { data, .. }) => {
                        if output_tx.send(ShellOutput::Stderr(data.to_vec())).await.is_err() {
                            break;
                        }
                    }
                    Some(ChannelMsg::ExitStatus { exit_status }) => {
                        let _ = output_tx.send(ShellOutput::Exit(exit_status)).await;
                    }
                    Some(ChannelMsg::Close) | None => break,
                    Some(_) => {}
                },
            }
        }

        tracing::debug!("Shell on {} finished", host);
    });

    ShellHandle::new(input_tx, output_rx)
}
