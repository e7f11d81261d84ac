//! Encryption key configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Key material for the secret cipher.
///
/// `encryption_key` may be 64 hex characters (used as-is) or any other
/// string (hashed down to 32 bytes). When absent, the process runs with an
/// ephemeral key and nothing it encrypts survives a restart.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CipherConfig {
    #[serde(default)]
    pub encryption_key: Option<String>,
}

impl CipherConfig {
    pub fn key_setting(&self) -> Option<&str> {
        self.encryption_key.as_deref()
    }

    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        match self.encryption_key.as_deref() {
            Some(key) if key.trim().is_empty() => Err(ValidationError::BlankEncryptionKey),
            None if production => Err(ValidationError::EncryptionKeyRequired),
            _ => Ok(()),
        }
    }
}
