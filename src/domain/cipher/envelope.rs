//! At-rest representation of encrypted values.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::CipherError;

/// AES-GCM nonce size in bytes.
pub(super) const NONCE_SIZE: usize = 12;

/// AES-GCM authentication tag size in bytes.
pub(super) const TAG_SIZE: usize = 16;

/// Opaque encrypted value: base64 of a JSON envelope holding the nonce,
/// authentication tag and ciphertext.
///
/// Only [`CipherService`](super::CipherService) produces new blobs or opens
/// them; everything else stores and passes them around as-is.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedBlob(String);

impl EncryptedBlob {
    /// Wraps a value read back from storage. No validation happens here;
    /// a malformed value fails on decrypt.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the stored representation.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(super) fn seal(envelope: &Envelope) -> Result<Self, CipherError> {
        let json = serde_json::to_vec(envelope)
            .map_err(|e| CipherError::Encryption(format!("envelope encoding: {}", e)))?;
        Ok(Self(BASE64.encode(json)))
    }

    pub(super) fn open(&self) -> Result<OpenedEnvelope, CipherError> {
        Envelope::parse(&self.0)?.decode()
    }
}

impl std::fmt::Debug for EncryptedBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncryptedBlob({} chars)", self.0.len())
    }
}

/// Wire shape of the envelope. Each field is standard base64.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub(super) struct Envelope {
    pub iv: String,
    pub tag: String,
    pub data: String,
}

/// Decoded envelope components.
pub(super) struct OpenedEnvelope {
    pub iv: Vec<u8>,
    pub tag: Vec<u8>,
    pub data: Vec<u8>,
}

impl Envelope {
    pub fn new(iv: &[u8], tag: &[u8], data: &[u8]) -> Self {
        Self {
            iv: BASE64.encode(iv),
            tag: BASE64.encode(tag),
            data: BASE64.encode(data),
        }
    }

    pub fn parse(value: &str) -> Result<Self, CipherError> {
        let json = BASE64
            .decode(value.trim())
            .map_err(|e| CipherError::Decryption(format!("blob is not base64: {}", e)))?;
        serde_json::from_slice(&json)
            .map_err(|e| CipherError::Decryption(format!("blob is not an envelope: {}", e)))
    }

    pub fn decode(&self) -> Result<OpenedEnvelope, CipherError> {
        let field = |name: &str, value: &str| {
            BASE64
                .decode(value)
                .map_err(|e| CipherError::Decryption(format!("{} is not base64: {}", name, e)))
        };
        let iv = field("iv", &self.iv)?;
        let tag = field("tag", &self.tag)?;
        let data = field("data", &self.data)?;

        if iv.len() != NONCE_SIZE {
            return Err(CipherError::Decryption(format!(
                "nonce must be {} bytes, got {}",
                NONCE_SIZE,
                iv.len()
            )));
        }
        if tag.len() != TAG_SIZE {
            return Err(CipherError::Decryption(format!(
                "tag must be {} bytes, got {}",
                TAG_SIZE,
                tag.len()
            )));
        }

        Ok(OpenedEnvelope { iv, tag, data })
    }
}

/// Returns true only if `value` decodes as the canonical envelope with all
/// three fields well-formed.
pub fn is_encrypted_data(value: &str) -> bool {
    Envelope::parse(value)
        .and_then(|envelope| envelope.decode())
        .map(|opened| !opened.data.is_empty())
        .unwrap_or(false)
}
