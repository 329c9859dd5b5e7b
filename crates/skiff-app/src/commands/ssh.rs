//! Tauri commands for remote session management.
//!
//! These are invoked from the frontend via `invoke()`. `ssh_connect` is
//! request/response; the others are fire-and-forget. Push events for a
//! session flow back over the channel passed to `ssh_connect`.

use serde::Serialize;
use skiff_ssh::{ConnectAck, ConnectConfig, SessionEvent, SessionStatus};

use crate::ipc::ChannelSink;
use crate::state::AppState;

/// Open a remote session.
///
/// Resolves once the transport is authenticated; shell negotiation may still
/// be in flight and reports failure as an `error` event on `channel`. A
/// transport failure rejects the call and no session (or tab) comes to
/// exist.
#[tauri::command]
pub async fn ssh_connect(
    state: tauri::State<'_, AppState>,
    id: String,
    config: ConnectConfig,
    channel: tauri::ipc::Channel<SessionEvent>,
) -> Result<ConnectAck, String> {
    state
        .sessions
        .connect(&id, config, ChannelSink::new(channel))
        .await
        .map_err(|e| e.to_string())
}

/// Forward keystrokes to a session's shell. Input for an unknown session or
/// a not-yet-negotiated shell is dropped.
#[tauri::command]
pub async fn ssh_write(
    state: tauri::State<'_, AppState>,
    id: String,
    data: Vec<u8>,
) -> Result<(), String> {
    state.sessions.write(&id, &data);
    Ok(())
}

/// Update a session's terminal window dimensions.
#[tauri::command]
pub async fn ssh_resize(
    state: tauri::State<'_, AppState>,
    id: String,
    rows: u16,
    cols: u16,
) -> Result<(), String> {
    state.sessions.resize(&id, rows, cols);
    Ok(())
}

/// Tear down a session. Safe to repeat and safe on unknown ids; the
/// session's `closed` event fires exactly once.
#[tauri::command]
pub async fn ssh_disconnect(state: tauri::State<'_, AppState>, id: String) -> Result<(), String> {
    state.sessions.disconnect(&id);
    Ok(())
}

/// One registered session, as reported to the frontend.
#[derive(Serialize)]
pub struct SessionEntry {
    pub id: String,
    pub status: SessionStatus,
}

/// Registered sessions with their status, e.g. for restoring tabs.
#[tauri::command]
pub async fn list_sessions(state: tauri::State<'_, AppState>) -> Result<Vec<SessionEntry>, String> {
    Ok(state
        .sessions
        .session_ids()
        .into_iter()
        .filter_map(|id| {
            state
                .sessions
                .status(&id)
                .map(|status| SessionEntry { id, status })
        })
        .collect())
}
