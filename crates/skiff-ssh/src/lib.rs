//! skiff-ssh: remote session lifecycle for Skiff.
//!
//! This crate sits between the secure transport (SSH) and the display
//! surface. It opens authenticated connections, negotiates interactive
//! shell channels over them, and bridges channel output to per-session
//! event sinks while keystrokes and resizes flow the other way.
//!
//! # Architecture
//!
//! - [`transport`] — the seam the manager is generic over: `Connector`,
//!   `Transport`, `ShellChannel`.
//! - [`SshConnector`] — russh-backed production implementation of the seam.
//! - [`SessionRegistry`] — per-id-atomic map of live [`Session`]s.
//! - [`SessionManager`] — connect / write / resize / disconnect, plus the
//!   per-session negotiation and pump tasks.
//! - [`SessionEvent`] / [`EventSink`] — the push surface the display side
//!   subscribes to.

pub mod config;
pub mod error;
pub mod events;
pub mod manager;
pub mod registry;
pub mod session;
pub mod ssh;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::ConnectConfig;
pub use error::{ChannelError, ConnectError, TransportError};
pub use events::{EventSink, SessionEvent};
pub use manager::{ConnectAck, SessionManager};
pub use registry::SessionRegistry;
pub use session::{Session, SessionStatus};
pub use ssh::SshConnector;
