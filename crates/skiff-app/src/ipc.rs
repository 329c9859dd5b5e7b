//! IPC types for communication between the Tauri backend and frontend.
//!
//! Session events reach the frontend over a per-session Tauri channel that
//! the webview hands in with each connect call, so delivery is scoped to
//! that session and dies with it.

use skiff_ssh::{EventSink, SessionEvent};

/// Event sink over one session's Tauri channel.
pub struct ChannelSink {
    channel: tauri::ipc::Channel<SessionEvent>,
}

impl ChannelSink {
    pub fn new(channel: tauri::ipc::Channel<SessionEvent>) -> Self {
        Self { channel }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: SessionEvent) {
        // Send failures mean the webview side is gone; there is nobody left
        // to tell.
        if self.channel.send(event).is_err() {
            log::debug!("event channel closed, dropping event");
        }
    }
}
