//! Dialing, tunneling and authentication with russh
//!
//! Multi-hop connections run SSH over SSH: each inner hop is reached through
//! a `direct-tcpip` channel on the previous session, and that channel is used
//! as the byte stream for the next handshake.

use async_trait::async_trait;
use russh::client::{self, Handle, Msg};
use russh::ChannelStream;
use russh_keys::key::KeyPair;
use std::sync::Arc;
use tokio::net::TcpStream;

use hp_core::error::FailureCause;
use hp_core::traits::RemoteShell;
use hp_core::EffectiveHost;

use crate::error::TransportError;
use crate::handler::ClientHandler;
use crate::session::SshSession;

/// Missed keep-alive replies tolerated before the session is dropped
const KEEPALIVE_MAX: usize = 3;

/// Byte stream a handshake runs over
pub enum Link {
    /// Direct TCP connection
    Tcp(TcpStream),
    /// Forwarded channel through the previous hop
    Channel(ChannelStream<Msg>),
}

/// [`RemoteShell`] implementation backed by russh
#[derive(Debug, Default, Clone)]
pub struct RusshShell;

impl RusshShell {
    pub fn new() -> Self {
        Self
    }
}

/// SSH client settings for a host
pub(crate) fn client_config(host: &EffectiveHost) -> Arc<client::Config> {
    Arc::new(client::Config {
        inactivity_timeout: None,
        keepalive_interval: host.keep_alive,
        keepalive_max: KEEPALIVE_MAX,
        ..Default::default()
    })
}

/// Load the host's private key, if it has one.
///
/// A key that cannot be loaded is only fatal when there is no password to
/// fall back to.
pub(crate) fn load_identity(host: &EffectiveHost) -> Result<Option<Arc<KeyPair>>, FailureCause> {
    let Some(path) = &host.auth.private_key else {
        return Ok(None);
    };

    match russh_keys::load_secret_key(path, host.auth.passphrase.as_deref()) {
        Ok(key) => Ok(Some(Arc::new(key))),
        Err(source) => {
            let err = TransportError::Key {
                path: path.clone(),
                source,
            };
            if host.auth.password.is_some() {
                tracing::warn!("{}: {}; falling back to password", host.name, err);
                Ok(None)
            } else {
                Err(FailureCause::Key(err.to_string()))
            }
        }
    }
}

/// Offer the key first, then the password
async fn authenticate_user(
    handle: &mut Handle<ClientHandler>,
    host: &EffectiveHost,
) -> Result<bool, FailureCause> {
    let protocol = |e: russh::Error| FailureCause::Protocol(e.to_string());

    if let Some(key) = load_identity(host)? {
        tracing::debug!("{}: trying public key", host.name);
        if handle
            .authenticate_publickey(&host.user, key)
            .await
            .map_err(protocol)?
        {
            return Ok(true);
        }
    }

    if let Some(password) = &host.auth.password {
        tracing::debug!("{}: trying password", host.name);
        return handle
            .authenticate_password(&host.user, password)
            .await
            .map_err(protocol);
    }

    Ok(false)
}

#[async_trait]
impl RemoteShell for RusshShell {
    type Link = Link;
    type Session = SshSession;

    async fn dial(&self, host: &EffectiveHost) -> Result<Link, FailureCause> {
        let stream = TcpStream::connect((host.address.as_str(), host.port))
            .await
            .map_err(|e| FailureCause::Unreachable(format!("{}: {}", host.socket_address(), e)))?;
        // Interactive traffic is latency sensitive
        let _ = stream.set_nodelay(true);
        Ok(Link::Tcp(stream))
    }

    async fn tunnel(&self, via: &SshSession, host: &EffectiveHost) -> Result<Link, FailureCause> {
        let channel = via
            .handle()
            .channel_open_direct_tcpip(host.address.clone(), u32::from(host.port), "127.0.0.1", 0)
            .await
            .map_err(|e| {
                FailureCause::Unreachable(format!(
                    "{} via {}: {}",
                    host.socket_address(),
                    via.name(),
                    e
                ))
            })?;
        Ok(Link::Channel(channel.into_stream()))
    }

    async fn authenticate(&self, link: Link, host: &EffectiveHost) -> Result<SshSession, FailureCause> {
        let config = client_config(host);
        let handler = ClientHandler::new(host.name.as_str());

        let connected = match link {
            Link::Tcp(stream) => client::connect_stream(config, stream, handler).await,
            Link::Channel(stream) => client::connect_stream(config, stream, handler).await,
        };
        let mut handle = connected.map_err(|e| FailureCause::Protocol(e.to_string()))?;

        if !authenticate_user(&mut handle, host).await? {
            return Err(FailureCause::AuthRejected);
        }

        tracing::debug!("Authenticated to {} as {}", host.name, host.user);
        Ok(SshSession::new(host.name.clone(), handle))
    }
}
