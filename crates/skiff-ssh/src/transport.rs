//! The secure-transport seam.
//!
//! The session manager never talks to an SSH library directly; it is generic
//! over these traits. Production uses the russh-backed implementation in
//! [`crate::ssh`], tests inject scripted fakes. The traits are not used as
//! trait objects (the async methods make them non-object-safe), so dispatch
//! stays static through the manager's type parameters.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::config::ConnectConfig;
use crate::error::{ChannelError, TransportError};

/// One event on a shell channel's stream, in production order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// Output produced by the remote shell.
    Data(Vec<u8>),
    /// A non-fatal stream error; the channel stays usable.
    Error(String),
    /// Final event: the channel, or its whole transport, went away.
    Closed,
}

/// Receiving end of a channel's event stream.
pub type ChannelEvents = mpsc::UnboundedReceiver<ChannelEvent>;

/// Opens authenticated transports to remote hosts.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    type Transport: Transport;

    /// Dial, handshake and authenticate. Long-latency; callers must not
    /// hold any lock across this.
    async fn connect(&self, config: &ConnectConfig) -> Result<Self::Transport, TransportError>;
}

/// An authenticated connection capable of hosting an interactive shell.
///
/// Handles are cheap clones sharing one underlying connection; whatever
/// synchronization they need is their own, never the session registry's.
#[async_trait]
pub trait Transport: Clone + Send + Sync + 'static {
    type Channel: ShellChannel;

    /// Negotiate an interactive shell with the given window size. Returns
    /// the channel handle together with its event stream; the stream always
    /// terminates with [`ChannelEvent::Closed`].
    async fn open_shell(
        &self,
        cols: u16,
        rows: u16,
    ) -> Result<(Self::Channel, ChannelEvents), ChannelError>;

    /// Close the connection. Idempotent; safe to call with channels open.
    async fn close(&self);
}

/// Handle to an interactive shell stream.
///
/// Operations queue to the channel's I/O task and never block the caller.
/// Once the channel is closing, queued operations are dropped.
pub trait ShellChannel: Clone + Send + Sync + 'static {
    /// Forward input bytes verbatim to the remote shell.
    fn write(&self, bytes: Vec<u8>) -> Result<(), ChannelError>;

    /// Update the remote window dimensions.
    fn resize(&self, rows: u16, cols: u16) -> Result<(), ChannelError>;

    /// Ask the channel to shut down; its event stream ends with `Closed`.
    fn close(&self);
}
