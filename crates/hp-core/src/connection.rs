//! Multi-hop connection establishment
//!
//! A target behind proxies is reached by dialing the outermost hop, then
//! tunneling through each established session to the next address. Every
//! step is bounded by its own timeout and a failure tears down whatever was
//! already built.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{ConnectStage, ConnectionError, FailureCause, SessionError};
use crate::traits::{HopSession, PtyRequest, RemoteShell, ShellHandle};
use crate::types::EffectiveHost;

/// Establishes sessions through proxy chains
pub struct ConnectionManager<R: RemoteShell> {
    shell: Arc<R>,
    step_timeout: Duration,
}

impl<R: RemoteShell> Clone for ConnectionManager<R> {
    fn clone(&self) -> Self {
        Self {
            shell: self.shell.clone(),
            step_timeout: self.step_timeout,
        }
    }
}

impl<R: RemoteShell> ConnectionManager<R> {
    pub fn new(shell: R, step_timeout: Duration) -> Self {
        Self::from_shared(Arc::new(shell), step_timeout)
    }

    pub fn from_shared(shell: Arc<R>, step_timeout: Duration) -> Self {
        Self {
            shell,
            step_timeout,
        }
    }

    /// Connect to `target` through `chain` (outermost hop first).
    ///
    /// On failure every hop session already established is closed,
    /// innermost first, before the error is returned.
    pub async fn connect(
        &self,
        chain: &[EffectiveHost],
        target: &EffectiveHost,
    ) -> Result<Connection<R::Session>, ConnectionError> {
        let mut sessions: Vec<(String, R::Session)> = Vec::with_capacity(chain.len() + 1);

        match self.establish(chain, target, &mut sessions).await {
            Ok(()) => {
                tracing::info!(
                    "Connected to {} ({}) via {} hop(s)",
                    target.name,
                    target,
                    chain.len()
                );
                Ok(Connection {
                    target: target.name.clone(),
                    sessions,
                })
            }
            Err(e) => {
                tracing::warn!("Connection to {} failed: {}", target.name, e);
                close_sessions(sessions).await;
                Err(e)
            }
        }
    }

    async fn establish(
        &self,
        chain: &[EffectiveHost],
        target: &EffectiveHost,
        sessions: &mut Vec<(String, R::Session)>,
    ) -> Result<(), ConnectionError> {
        let route = chain.iter().chain(std::iter::once(target));

        for (position, host) in route.enumerate() {
            let link = match sessions.last() {
                None => {
                    self.step(host, position, ConnectStage::Dial, self.shell.dial(host))
                        .await?
                }
                Some((_, via)) => {
                    self.step(host, position, ConnectStage::Tunnel, self.shell.tunnel(via, host))
                        .await?
                }
            };

            let session = self
                .step(
                    host,
                    position,
                    ConnectStage::Authenticate,
                    self.shell.authenticate(link, host),
                )
                .await?;
            sessions.push((host.name.clone(), session));
        }

        Ok(())
    }

    async fn step<T>(
        &self,
        host: &EffectiveHost,
        position: usize,
        stage: ConnectStage,
        fut: impl Future<Output = Result<T, FailureCause>>,
    ) -> Result<T, ConnectionError> {
        tracing::debug!(
            "hop {} ({}): {} {}",
            position,
            host.name,
            stage,
            host.socket_address()
        );

        let cause = match tokio::time::timeout(self.step_timeout, fut).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(cause)) => cause,
            Err(_) => FailureCause::Timeout(self.step_timeout),
        };

        Err(ConnectionError {
            hop: host.name.clone(),
            position,
            stage,
            cause,
        })
    }
}

/// An authenticated session to a target and the hops it runs through
pub struct Connection<S: HopSession> {
    target: String,
    /// Outermost first; the target session is last
    sessions: Vec<(String, S)>,
}

impl<S: HopSession> Connection<S> {
    /// Name of the target host
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Names of every hop, outermost first, ending with the target
    pub fn route(&self) -> Vec<&str> {
        self.sessions.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn session(&self) -> Result<&S, SessionError> {
        self.sessions
            .last()
            .map(|(_, session)| session)
            .ok_or(SessionError::Closed)
    }

    /// Open an interactive shell on the target
    pub async fn open_shell(&self, pty: PtyRequest) -> Result<ShellHandle, SessionError> {
        self.session()?.open_shell(pty).await
    }

    /// Open a file transfer channel on the target
    pub async fn open_transfer(&self) -> Result<S::Transfer, SessionError> {
        self.session()?.open_transfer().await
    }

    /// Close the target session and every hop, innermost first
    pub async fn close(self) {
        tracing::debug!("Closing connection to {}", self.target);
        close_sessions(self.sessions).await;
    }
}

async fn close_sessions<S: HopSession>(mut sessions: Vec<(String, S)>) {
    while let Some((name, session)) = sessions.pop() {
        if let Err(e) = session.close().await {
            tracing::debug!("Error closing session to {}: {}", name, e);
        }
    }
}
