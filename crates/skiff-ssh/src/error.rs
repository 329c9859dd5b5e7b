//! Error types for skiff-ssh.

use thiserror::Error;

/// Connect-time transport failures.
///
/// These reject the `connect` call that was waiting on them; they are never
/// delivered as push events, and no session is registered when one occurs.
#[derive(Error, Debug)]
pub enum TransportError {
    /// TCP connect or protocol handshake failed.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// The remote host rejected the supplied credentials.
    #[error("authentication rejected for {0}")]
    AuthRejected(String),

    /// The private key referenced by the config could not be loaded.
    #[error("unusable private key: {0}")]
    BadKey(String),

    /// The config carried neither a password nor a private key path.
    #[error("no credentials supplied")]
    NoCredentials,
}

/// Failures on a shell channel after the transport came up.
///
/// These never reject a waiting caller: they reach the display surface as
/// `error` push events on the owning session.
#[derive(Error, Debug)]
pub enum ChannelError {
    /// Opening or negotiating the interactive shell failed.
    #[error("shell negotiation failed: {0}")]
    Negotiation(String),

    /// The channel's I/O task is gone; the stream has ended.
    #[error("channel closed")]
    Closed,
}

/// Rejection of a `connect` request.
#[derive(Error, Debug)]
pub enum ConnectError {
    /// Session ids are caller-supplied and must be non-empty.
    #[error("session id must not be empty")]
    EmptyId,

    /// A session with this id is already registered.
    #[error("session already exists: {0}")]
    SessionExists(String),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
