//! Tauri commands for credential encryption.

use crate::state::AppState;

/// Encrypt a secret for at-rest storage. Fails, rather than passing the
/// plaintext through, when platform secure storage is unavailable.
#[tauri::command]
pub async fn vault_encrypt(
    state: tauri::State<'_, AppState>,
    plaintext: String,
) -> Result<String, String> {
    state.vault.encrypt(&plaintext).map_err(|e| e.to_string())
}

/// Decrypt a secret previously produced by `vault_encrypt`.
#[tauri::command]
pub async fn vault_decrypt(
    state: tauri::State<'_, AppState>,
    ciphertext: String,
) -> Result<String, String> {
    state.vault.decrypt(&ciphertext).map_err(|e| e.to_string())
}
