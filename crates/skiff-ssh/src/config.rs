//! Connection configuration for remote sessions.

use std::fmt;
use std::path::PathBuf;

use serde::Deserialize;

fn default_port() -> u16 {
    22
}

/// Settings for opening one remote session, deserialized from the connect
/// request. Carries either a password or a path to a private key; when both
/// are present the password wins.
#[derive(Clone, Deserialize)]
pub struct ConnectConfig {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub username: String,
    /// Password authentication secret.
    #[serde(default)]
    pub password: Option<String>,
    /// Path to a private key file, used when no password is given.
    #[serde(default)]
    pub private_key_path: Option<PathBuf>,
    /// Passphrase protecting the private key, if any.
    #[serde(default)]
    pub key_passphrase: Option<String>,
}

impl ConnectConfig {
    /// The dial address as (host, port).
    pub fn address(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

// Manual Debug so secrets never end up in logs.
impl fmt::Debug for ConnectConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("private_key_path", &self.private_key_path)
            .finish()
    }
}
