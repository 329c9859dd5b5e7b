//! Key storage backed by the platform keychain.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use log::info;
use rand::RngCore;

use crate::VaultError;

/// Length of the vault key in bytes (a 256-bit ChaCha20 key).
pub const KEY_LEN: usize = 32;

/// Provides the vault's symmetric key.
pub trait KeyStore: Send + Sync {
    /// Return the per-user key, creating it on first use. Any failure to
    /// reach secure storage must surface as `EncryptionUnavailable`.
    fn load_or_create_key(&self) -> Result<[u8; KEY_LEN], VaultError>;
}

/// Keeps the key in the platform keychain (macOS Keychain, Windows
/// Credential Manager, Linux kernel keyutils), bound to the current OS user.
pub struct OsKeyStore {
    service: String,
    account: String,
}

impl Default for OsKeyStore {
    fn default() -> Self {
        Self {
            service: "dev.skiff.vault".into(),
            account: "vault-key".into(),
        }
    }
}

impl KeyStore for OsKeyStore {
    fn load_or_create_key(&self) -> Result<[u8; KEY_LEN], VaultError> {
        let entry = keyring::Entry::new(&self.service, &self.account)
            .map_err(|e| VaultError::EncryptionUnavailable(e.to_string()))?;

        match entry.get_password() {
            Ok(encoded) => decode_key(&encoded),
            Err(keyring::Error::NoEntry) => {
                let mut key = [0u8; KEY_LEN];
                rand::thread_rng().fill_bytes(&mut key);
                entry
                    .set_password(&BASE64.encode(key))
                    .map_err(|e| VaultError::EncryptionUnavailable(e.to_string()))?;
                info!("created vault key in platform keychain");
                Ok(key)
            }
            Err(e) => Err(VaultError::EncryptionUnavailable(e.to_string())),
        }
    }
}

fn decode_key(encoded: &str) -> Result<[u8; KEY_LEN], VaultError> {
    // A key we cannot parse is unusable, but overwriting it would orphan
    // every secret it ever sealed: refuse instead.
    let bytes = BASE64
        .decode(encoded)
        .map_err(|_| VaultError::EncryptionUnavailable("stored vault key is malformed".into()))?;
    bytes
        .try_into()
        .map_err(|_| VaultError::EncryptionUnavailable("stored vault key is malformed".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_key_roundtrip() {
        let key = [7u8; KEY_LEN];
        assert_eq!(decode_key(&BASE64.encode(key)).unwrap(), key);
    }

    #[test]
    fn test_decode_key_rejects_bad_base64() {
        assert!(matches!(
            decode_key("not base64!!"),
            Err(VaultError::EncryptionUnavailable(_))
        ));
    }

    #[test]
    fn test_decode_key_rejects_wrong_length() {
        let short = BASE64.encode([1u8; 16]);
        assert!(matches!(
            decode_key(&short),
            Err(VaultError::EncryptionUnavailable(_))
        ));
    }
}
