//! russh-backed implementation of the transport seam.
//!
//! Every russh type stays inside this module; the rest of the crate only
//! sees the [`crate::transport`] traits. Each shell channel is owned by a
//! dedicated tokio task that forwards remote output onto the event stream
//! and executes queued write/resize/close commands, so no lock is ever held
//! across channel I/O.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use russh::client;
use russh::{ChannelMsg, Disconnect};
use russh_keys::key;
use tokio::sync::{mpsc, Mutex};

use crate::config::ConnectConfig;
use crate::error::{ChannelError, TransportError};
use crate::transport::{ChannelEvent, ChannelEvents, Connector, ShellChannel, Transport};

const TERM: &str = "xterm-256color";

/// Accepts any host key, logging its fingerprint. The client keeps no
/// known-hosts store; pinning would slot in here if it grows one.
struct AcceptingHost;

#[async_trait]
impl client::Handler for AcceptingHost {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &key::PublicKey,
    ) -> Result<bool, Self::Error> {
        debug!("server key fingerprint: {}", server_public_key.fingerprint());
        Ok(true)
    }
}

/// Opens authenticated SSH connections.
pub struct SshConnector {
    config: Arc<client::Config>,
}

impl SshConnector {
    pub fn new() -> Self {
        let config = client::Config {
            inactivity_timeout: Some(Duration::from_secs(3600)),
            ..Default::default()
        };
        Self {
            config: Arc::new(config),
        }
    }
}

impl Default for SshConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for SshConnector {
    type Transport = SshTransport;

    async fn connect(&self, config: &ConnectConfig) -> Result<SshTransport, TransportError> {
        let mut handle = client::connect(Arc::clone(&self.config), config.address(), AcceptingHost)
            .await
            .map_err(|e| TransportError::Handshake(e.to_string()))?;

        let authenticated = if let Some(password) = &config.password {
            handle
                .authenticate_password(config.username.clone(), password.clone())
                .await
                .map_err(|e| TransportError::Handshake(e.to_string()))?
        } else if let Some(path) = &config.private_key_path {
            let keypair = russh_keys::load_secret_key(path, config.key_passphrase.as_deref())
                .map_err(|e| TransportError::BadKey(e.to_string()))?;
            handle
                .authenticate_publickey(config.username.clone(), Arc::new(keypair))
                .await
                .map_err(|e| TransportError::Handshake(e.to_string()))?
        } else {
            return Err(TransportError::NoCredentials);
        };

        if !authenticated {
            return Err(TransportError::AuthRejected(config.username.clone()));
        }

        info!("authenticated to {}:{}", config.host, config.port);
        Ok(SshTransport {
            handle: Arc::new(Mutex::new(handle)),
        })
    }
}

/// Cloneable handle to one authenticated SSH connection.
#[derive(Clone)]
pub struct SshTransport {
    handle: Arc<Mutex<client::Handle<AcceptingHost>>>,
}

#[async_trait]
impl Transport for SshTransport {
    type Channel = SshChannel;

    async fn open_shell(
        &self,
        cols: u16,
        rows: u16,
    ) -> Result<(SshChannel, ChannelEvents), ChannelError> {
        let mut channel = {
            let mut handle = self.handle.lock().await;
            handle
                .channel_open_session()
                .await
                .map_err(negotiation_err)?
        };
        channel
            .request_pty(false, TERM, cols as u32, rows as u32, 0, 0, &[])
            .await
            .map_err(negotiation_err)?;
        channel.request_shell(false).await.map_err(negotiation_err)?;

        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        tokio::spawn(channel_loop(channel, cmd_rx, event_tx));

        Ok((SshChannel { cmd_tx }, event_rx))
    }

    async fn close(&self) {
        let mut handle = self.handle.lock().await;
        if let Err(e) = handle
            .disconnect(Disconnect::ByApplication, "session closed", "en")
            .await
        {
            debug!("disconnect: {e}");
        }
    }
}

fn negotiation_err(e: russh::Error) -> ChannelError {
    ChannelError::Negotiation(e.to_string())
}

enum ChannelCmd {
    Write(Vec<u8>),
    Resize { rows: u16, cols: u16 },
    Close,
}

/// Handle to an interactive shell stream; operations queue to the owning
/// channel task.
#[derive(Clone)]
pub struct SshChannel {
    cmd_tx: mpsc::UnboundedSender<ChannelCmd>,
}

impl ShellChannel for SshChannel {
    fn write(&self, bytes: Vec<u8>) -> Result<(), ChannelError> {
        self.cmd_tx
            .send(ChannelCmd::Write(bytes))
            .map_err(|_| ChannelError::Closed)
    }

    fn resize(&self, rows: u16, cols: u16) -> Result<(), ChannelError> {
        self.cmd_tx
            .send(ChannelCmd::Resize { rows, cols })
            .map_err(|_| ChannelError::Closed)
    }

    fn close(&self) {
        let _ = self.cmd_tx.send(ChannelCmd::Close);
    }
}

/// Owns the russh channel until it closes on either side: forwards remote
/// output as events, executes queued commands, and always terminates the
/// event stream with `Closed`.
async fn channel_loop(
    mut channel: russh::Channel<client::Msg>,
    mut cmd_rx: mpsc::UnboundedReceiver<ChannelCmd>,
    event_tx: mpsc::UnboundedSender<ChannelEvent>,
) {
    loop {
        tokio::select! {
            msg = channel.wait() => match msg {
                Some(ChannelMsg::Data { ref data }) => {
                    if event_tx.send(ChannelEvent::Data(data.to_vec())).is_err() {
                        break;
                    }
                }
                Some(ChannelMsg::ExtendedData { ref data, .. }) => {
                    if event_tx.send(ChannelEvent::Data(data.to_vec())).is_err() {
                        break;
                    }
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    debug!("shell exited with status {exit_status}");
                }
                Some(ChannelMsg::Eof) => {}
                Some(ChannelMsg::Close) | None => break,
                Some(_) => {}
            },
            cmd = cmd_rx.recv() => match cmd {
                Some(ChannelCmd::Write(bytes)) => {
                    if let Err(e) = channel.data(&bytes[..]).await {
                        let _ = event_tx.send(ChannelEvent::Error(format!("write failed: {e}")));
                    }
                }
                Some(ChannelCmd::Resize { rows, cols }) => {
                    if let Err(e) = channel.window_change(cols as u32, rows as u32, 0, 0).await {
                        let _ = event_tx.send(ChannelEvent::Error(format!("resize failed: {e}")));
                    }
                }
                Some(ChannelCmd::Close) | None => {
                    let _ = channel.eof().await;
                    break;
                }
            },
        }
    }
    let _ = event_tx.send(ChannelEvent::Closed);
}
