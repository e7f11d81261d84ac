//! Cipher module - Secret protection at rest.
//!
//! - `CipherService` - AEAD encryption, password hashing, secure tokens
//! - `EncryptedBlob` - Opaque at-rest representation of a secret
//! - `KeyMaterial` - Resolution of the process-wide key from configuration

mod envelope;
mod errors;
mod key;
mod service;

pub use envelope::EncryptedBlob;
pub use errors::CipherError;
pub use key::{KeyMaterial, KeySource, KEY_SIZE};
pub use service::{CipherService, PasswordHashParams};
