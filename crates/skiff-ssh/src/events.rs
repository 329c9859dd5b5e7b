//! Push events delivered from the privileged backend to the display surface.
//!
//! Everything the rendering side learns about a session after `connect`
//! resolves arrives as a `SessionEvent`, serialized as tagged JSON over the
//! per-session channel handed in with the connect request.

use serde::Serialize;

/// One notification about a session, addressed by its id.
///
/// Per-id ordering: every `Data` event is delivered in channel production
/// order, `Closed` is delivered exactly once and last, and no `Data` or
/// `Error` for an id follows its `Closed`. No ordering exists across ids.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Shell output bytes, verbatim.
    Data { id: String, bytes: Vec<u8> },
    /// A non-fatal failure on a live session: shell negotiation after a
    /// successful connect, or a stream error. Does not close the session.
    Error { id: String, message: String },
    /// The session is gone, whichever side ended it.
    Closed { id: String },
}

impl SessionEvent {
    /// The id of the session this event belongs to.
    pub fn id(&self) -> &str {
        match self {
            SessionEvent::Data { id, .. }
            | SessionEvent::Error { id, .. }
            | SessionEvent::Closed { id } => id,
        }
    }
}

/// Delivery surface for session events.
///
/// Implementations must not block: `emit` runs on event pumps and, briefly,
/// under a registry entry lock.
pub trait EventSink: Send + Sync + 'static {
    fn emit(&self, event: SessionEvent);
}
