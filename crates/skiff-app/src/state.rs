//! Application state shared between Tauri commands and session tasks.

use skiff_ssh::{SessionManager, SshConnector};
use skiff_vault::Vault;

/// Global app state managed by Tauri.
pub struct AppState {
    /// Owns every live remote session.
    pub sessions: SessionManager<SshConnector>,
    /// At-rest encryption for credentials.
    pub vault: Vault,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            sessions: SessionManager::new(SshConnector::new()),
            vault: Vault::new(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
