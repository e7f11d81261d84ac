//! Key material resolution for the cipher service.

use rand::rngs::OsRng;
use rand::RngCore;
use secrecy::{ExposeSecret, Secret};
use sha2::{Digest, Sha256};

use super::CipherError;

/// AES-256 key size in bytes.
pub const KEY_SIZE: usize = 32;

/// Where the active key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// 64 hex characters taken verbatim.
    Hex,
    /// Arbitrary string hashed down to 32 bytes with SHA-256.
    Derived,
    /// Random key generated for this process only.
    Ephemeral,
}

/// Resolved 256-bit key plus its provenance.
pub struct KeyMaterial {
    key: Secret<[u8; KEY_SIZE]>,
    source: KeySource,
}

impl KeyMaterial {
    /// Resolves key material from the configured setting.
    ///
    /// - 64 hex characters are decoded directly.
    /// - Any other non-blank string is hashed with SHA-256.
    /// - No setting at all yields an ephemeral random key; values encrypted
    ///   with it cannot be read after a restart.
    ///
    /// # Errors
    ///
    /// `KeyMaterial` if a key is configured but blank.
    pub fn resolve(configured: Option<&str>) -> Result<Self, CipherError> {
        match configured {
            Some(raw) => {
                let raw = raw.trim();
                if raw.is_empty() {
                    return Err(CipherError::KeyMaterial(
                        "encryption key is configured but blank".to_string(),
                    ));
                }
                if raw.len() == KEY_SIZE * 2 && raw.chars().all(|c| c.is_ascii_hexdigit()) {
                    let mut key = [0u8; KEY_SIZE];
                    hex::decode_to_slice(raw, &mut key)
                        .map_err(|e| CipherError::KeyMaterial(e.to_string()))?;
                    return Ok(Self::from_bytes(key, KeySource::Hex));
                }
                let digest = Sha256::digest(raw.as_bytes());
                let mut key = [0u8; KEY_SIZE];
                key.copy_from_slice(&digest);
                Ok(Self::from_bytes(key, KeySource::Derived))
            }
            None => {
                tracing::warn!(
                    "No encryption key configured: generated an ephemeral key. \
                     Encrypted provider secrets will be unreadable after a restart. \
                     Never run like this outside local development."
                );
                Ok(Self::ephemeral())
            }
        }
    }

    /// Generates a random key for the lifetime of this process.
    pub fn ephemeral() -> Self {
        let mut key = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut key);
        Self::from_bytes(key, KeySource::Ephemeral)
    }

    /// Wraps raw key bytes.
    pub fn from_bytes(key: [u8; KEY_SIZE], source: KeySource) -> Self {
        Self {
            key: Secret::new(key),
            source,
        }
    }

    /// Returns where the key came from.
    pub fn source(&self) -> KeySource {
        self.source
    }

    pub(super) fn bytes(&self) -> &[u8; KEY_SIZE] {
        self.key.expose_secret()
    }
}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("key", &"[REDACTED]")
            .field("source", &self.source)
            .finish()
    }
}
