//! skiff-vault: at-rest encryption for short secrets.
//!
//! Secrets (host passwords, key passphrases) are sealed with
//! ChaCha20-Poly1305 under a random 256-bit key that lives in the platform
//! keychain, bound to the current OS user. The persisted form is base64 so
//! it can sit in whatever host-entry store the frontend keeps. The vault
//! knows nothing about sessions.
//!
//! When secure storage is unavailable both operations fail; callers must
//! not fall back to persisting plaintext.

pub mod keystore;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use rand::RngCore;
use ring::aead::{Aad, LessSafeKey, Nonce, UnboundKey, CHACHA20_POLY1305, NONCE_LEN};
use thiserror::Error;

pub use keystore::{KeyStore, OsKeyStore, KEY_LEN};

/// Vault failures.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Platform secure storage cannot back the key.
    #[error("platform secure storage unavailable: {0}")]
    EncryptionUnavailable(String),
    /// The blob is malformed or was not produced by this vault and user.
    #[error("could not decrypt secret")]
    DecryptionFailed,
}

/// Encrypts and decrypts short secrets with the OS-backed per-user key.
pub struct Vault<K = OsKeyStore> {
    store: K,
}

impl Vault<OsKeyStore> {
    pub fn new() -> Self {
        Self {
            store: OsKeyStore::default(),
        }
    }
}

impl Default for Vault<OsKeyStore> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: KeyStore> Vault<K> {
    pub fn with_store(store: K) -> Self {
        Self { store }
    }

    /// Seal `plaintext` and return `base64(nonce || ciphertext || tag)`.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        let key = self.sealing_key()?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::assume_unique_for_key(nonce_bytes);

        let mut sealed = plaintext.as_bytes().to_vec();
        key.seal_in_place_append_tag(nonce, Aad::empty(), &mut sealed)
            .map_err(|_| VaultError::EncryptionUnavailable("seal failed".into()))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + sealed.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&sealed);
        Ok(BASE64.encode(blob))
    }

    /// Inverse of [`encrypt`](Self::encrypt). Anything that is not a blob
    /// this vault produced under the current user's key fails with
    /// `DecryptionFailed`.
    pub fn decrypt(&self, encoded: &str) -> Result<String, VaultError> {
        let key = self.sealing_key()?;

        let blob = BASE64
            .decode(encoded)
            .map_err(|_| VaultError::DecryptionFailed)?;
        if blob.len() < NONCE_LEN + CHACHA20_POLY1305.tag_len() {
            return Err(VaultError::DecryptionFailed);
        }
        let (nonce_bytes, sealed) = blob.split_at(NONCE_LEN);
        let nonce =
            Nonce::try_assume_unique_for_key(nonce_bytes).map_err(|_| VaultError::DecryptionFailed)?;

        let mut sealed = sealed.to_vec();
        let opened = key
            .open_in_place(nonce, Aad::empty(), &mut sealed)
            .map_err(|_| VaultError::DecryptionFailed)?;
        String::from_utf8(opened.to_vec()).map_err(|_| VaultError::DecryptionFailed)
    }

    fn sealing_key(&self) -> Result<LessSafeKey, VaultError> {
        let key_bytes = self.store.load_or_create_key()?;
        let unbound = UnboundKey::new(&CHACHA20_POLY1305, &key_bytes)
            .map_err(|_| VaultError::EncryptionUnavailable("bad key material".into()))?;
        Ok(LessSafeKey::new(unbound))
    }
}
