//! Cipher error types.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors raised by the secret cipher service.
///
/// Every variant is a hard failure: callers never receive a default or the
/// original input in place of a failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipherError {
    /// Plaintext was empty or the cipher rejected the input.
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Blob is malformed, nonce/tag do not parse, or authentication failed.
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// Configured key material cannot be used.
    #[error("Invalid key material: {0}")]
    KeyMaterial(String),

    /// Password hashing parameters or salt generation failed.
    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

impl From<CipherError> for DomainError {
    fn from(err: CipherError) -> Self {
        let code = match err {
            CipherError::Decryption(_) => ErrorCode::DecryptionFailed,
            CipherError::Encryption(_) | CipherError::PasswordHash(_) => {
                ErrorCode::EncryptionFailed
            }
            CipherError::KeyMaterial(_) => ErrorCode::InternalError,
        };
        DomainError::new(code, err.to_string())
    }
}
