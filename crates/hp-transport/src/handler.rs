//! russh client handler

use async_trait::async_trait;
use russh::client;
use russh_keys::key::PublicKey;

/// Client-side callbacks for one hop
pub struct ClientHandler {
    /// Host name, for logging
    host: String,
}

impl ClientHandler {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = russh::Error;

    /// Accept the server's host key.
    ///
    /// Hosts come from the operator's own registry; the fingerprint is
    /// logged so it can be checked by hand.
    async fn check_server_key(&mut self, server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        tracing::debug!(
            "{} host key: {}",
            self.host,
            server_public_key.fingerprint()
        );
        Ok(true)
    }
}
