//! A single remote shell session.

use std::sync::Arc;

use serde::Serialize;

use crate::events::EventSink;
use crate::transport::Transport;

/// Lifecycle of a session.
///
/// Registered sessions move `Connecting` to `Ready` when the shell channel
/// attaches. `Closed` and `Failed` are terminal and never stored: a `Failed`
/// session was never registered (its connect was rejected), and a `Closed`
/// session has already been removed from the registry.
#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    /// Transport is up; shell negotiation still in flight.
    Connecting,
    /// Shell channel attached; bytes flow both ways.
    Ready,
    /// Torn down and deregistered.
    Closed,
    /// Transport never came up.
    Failed,
}

/// The pairing of one transport and, once negotiated, its shell channel,
/// plus the per-session event sink supplied at connect time.
///
/// Both handles live in one record, so neither can go missing while the
/// other persists, and a channel can never outlive its transport.
pub struct Session<T: Transport> {
    pub(crate) status: SessionStatus,
    pub(crate) transport: T,
    pub(crate) channel: Option<T::Channel>,
    pub(crate) events: Arc<dyn EventSink>,
}

impl<T: Transport> Session<T> {
    /// A freshly registered session: transport ready, no channel yet.
    pub(crate) fn connecting(transport: T, events: Arc<dyn EventSink>) -> Self {
        Self {
            status: SessionStatus::Connecting,
            transport,
            channel: None,
            events,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Whether the shell channel has been negotiated and attached.
    pub fn channel_attached(&self) -> bool {
        self.channel.is_some()
    }

    /// Attach the negotiated shell channel.
    pub(crate) fn attach(&mut self, channel: T::Channel) {
        debug_assert!(self.channel.is_none(), "channel attached twice");
        self.channel = Some(channel);
        self.status = SessionStatus::Ready;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeTransport, RecordingSink};
    use crate::transport::Transport as _;

    #[test]
    fn test_new_session_is_connecting_without_channel() {
        let session = Session::connecting(FakeTransport::ok(), RecordingSink::shared());
        assert_eq!(session.status(), SessionStatus::Connecting);
        assert!(!session.channel_attached());
    }

    #[tokio::test]
    async fn test_attach_moves_to_ready() {
        let transport = FakeTransport::ok();
        let mut session = Session::connecting(transport.clone(), RecordingSink::shared());

        let (channel, _events) = transport.open_shell(80, 24).await.unwrap();
        session.attach(channel);

        assert_eq!(session.status(), SessionStatus::Ready);
        assert!(session.channel_attached());
    }
}
