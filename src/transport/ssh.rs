use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, trace};
use russh::client::{self, AuthResult, Handle};
use russh::keys::PublicKey;
use russh::{Channel, ChannelMsg, Disconnect};

use super::{Connection, SecurityLevel, ShellChannel, Transport};
use crate::error::TransportError;

/// Production transport: password-authenticated SSH via russh.
///
/// One instance is built per run and shared by all workers; every
/// [`connect`](Transport::connect) call produces an independent connection.
pub struct SshTransport {
    config: Arc<client::Config>,
}

impl SshTransport {
    /// Creates a transport negotiating with the given algorithm profile.
    pub fn new(level: SecurityLevel) -> Self {
        let config = client::Config {
            preferred: level.preferred(),
            // Bounds handshake and channel-request stalls after connect.
            inactivity_timeout: Some(Duration::from_secs(60)),
            ..Default::default()
        };
        SshTransport {
            config: Arc::new(config),
        }
    }
}

/// Host key policy: accept whatever the device presents.
///
/// Fleet inventories rarely come with centrally distributed host keys, and
/// batch collection against hundreds of devices cannot stop for interactive
/// fingerprint confirmation.
struct AcceptAnyHostKey;

impl client::Handler for AcceptAnyHostKey {
    type Error = russh::Error;

    async fn check_server_key(&mut self, _server_public_key: &PublicKey) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

#[async_trait]
impl Transport for SshTransport {
    type Conn = SshConnection;

    async fn connect(
        &self,
        address: &str,
        timeout: Duration,
    ) -> Result<SshConnection, TransportError> {
        let connecting = client::connect(self.config.clone(), address, AcceptAnyHostKey);
        let handle = match tokio::time::timeout(timeout, connecting).await {
            Ok(result) => result?,
            Err(_) => return Err(TransportError::Timeout(timeout)),
        };
        debug!("{address} TCP connection successful");

        Ok(SshConnection {
            address: address.to_string(),
            handle,
        })
    }
}

/// An established SSH connection, pre-authentication.
pub struct SshConnection {
    address: String,
    handle: Handle<AcceptAnyHostKey>,
}

#[async_trait]
impl Connection for SshConnection {
    type Shell = SshShell;

    async fn authenticate(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<(), TransportError> {
        match self.handle.authenticate_password(username, password).await? {
            AuthResult::Success => {
                debug!("{} authenticated as {username}", self.address);
                Ok(())
            }
            AuthResult::Failure { .. } => Err(TransportError::CredentialsRejected),
        }
    }

    async fn open_shell(&mut self) -> Result<SshShell, TransportError> {
        let channel = self.handle.channel_open_session().await?;
        debug!("{} session channel opened", self.address);

        Ok(SshShell {
            address: self.address.clone(),
            channel,
        })
    }

    async fn close(&mut self) {
        let _ = self
            .handle
            .disconnect(Disconnect::ByApplication, "batch run finished", "en")
            .await;
        trace!("{} connection closed", self.address);
    }
}

/// An interactive shell channel on an [`SshConnection`].
pub struct SshShell {
    address: String,
    channel: Channel<client::Msg>,
}

#[async_trait]
impl ShellChannel for SshShell {
    async fn setup_terminal(&mut self, width: u32, height: u32) -> Result<(), TransportError> {
        self.channel
            .request_pty(false, "xterm", width, height, 0, 0, &[])
            .await?;
        self.channel.request_shell(false).await?;
        debug!("{} shell request successful", self.address);
        Ok(())
    }

    async fn send_line(&mut self, line: &str) -> Result<(), TransportError> {
        let mut data = Vec::with_capacity(line.len() + 1);
        data.extend_from_slice(line.as_bytes());
        data.push(b'\n');
        self.channel.data(&data[..]).await?;
        Ok(())
    }

    async fn recv(&mut self) -> Option<Vec<u8>> {
        loop {
            match self.channel.wait().await? {
                ChannelMsg::Data { ref data } => return Some(data.to_vec()),
                ChannelMsg::ExtendedData { ref data, .. } => return Some(data.to_vec()),
                ChannelMsg::ExitStatus { exit_status } => {
                    trace!("{} shell exited with status {exit_status}", self.address);
                }
                ChannelMsg::Eof => return None,
                _ => {}
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.channel.eof().await;
        trace!("{} channel closed", self.address);
    }
}
