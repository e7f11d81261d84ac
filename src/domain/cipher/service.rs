//! Secret cipher service.
//!
//! Protects provider credentials and webhook secrets at rest with
//! AES-256-GCM, hashes operator passwords with Argon2id, and offers secure
//! tokens and SHA-256 fingerprints.
//!
//! The service holds only read-only key material, so a single instance is
//! shared across tasks behind an `Arc` without further locking.

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadCore, AeadInPlace, KeyInit, OsRng};
use aes_gcm::Aes256Gcm;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use secrecy::SecretString;
use sha2::{Digest, Sha256};

use super::envelope::{Envelope, EncryptedBlob};
use super::key::{KeyMaterial, KeySource};
use super::CipherError;

/// Associated data bound into every ciphertext.
const ASSOCIATED_DATA: &[u8] = b"paygate.secret.v1";

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHashParams {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for PasswordHashParams {
    /// 64 MiB, 3 passes, single lane.
    fn default() -> Self {
        Self {
            memory_kib: 64 * 1024,
            iterations: 3,
            parallelism: 1,
        }
    }
}

/// Symmetric encryption, password hashing and secure randomness.
#[derive(Clone)]
pub struct CipherService {
    cipher: Aes256Gcm,
    key_source: KeySource,
    password_params: PasswordHashParams,
}

impl CipherService {
    /// Creates a service from resolved key material.
    pub fn new(key: KeyMaterial) -> Self {
        Self {
            cipher: Aes256Gcm::new(GenericArray::from_slice(key.bytes())),
            key_source: key.source(),
            password_params: PasswordHashParams::default(),
        }
    }

    /// Resolves key material from a configured setting and builds the service.
    ///
    /// # Errors
    ///
    /// `KeyMaterial` if the setting is present but unusable.
    pub fn from_key_setting(configured: Option<&str>) -> Result<Self, CipherError> {
        Ok(Self::new(KeyMaterial::resolve(configured)?))
    }

    /// Overrides the Argon2id cost parameters.
    pub fn with_password_params(mut self, params: PasswordHashParams) -> Self {
        self.password_params = params;
        self
    }

    /// Returns true when the key only lives for this process.
    pub fn is_ephemeral(&self) -> bool {
        self.key_source == KeySource::Ephemeral
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Authenticated encryption
    // ─────────────────────────────────────────────────────────────────────────

    /// Encrypts `plaintext` under a fresh random nonce.
    ///
    /// # Errors
    ///
    /// `Encryption` on empty input.
    pub fn encrypt(&self, plaintext: &str) -> Result<EncryptedBlob, CipherError> {
        if plaintext.is_empty() {
            return Err(CipherError::Encryption(
                "refusing to encrypt an empty value".to_string(),
            ));
        }

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = self
            .cipher
            .encrypt_in_place_detached(&nonce, ASSOCIATED_DATA, &mut buffer)
            .map_err(|_| CipherError::Encryption("cipher rejected input".to_string()))?;

        EncryptedBlob::seal(&Envelope::new(&nonce, &tag, &buffer))
    }

    /// Opens a blob produced by [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    ///
    /// `Decryption` if the blob is malformed or fails authentication.
    pub fn decrypt(&self, blob: &EncryptedBlob) -> Result<SecretString, CipherError> {
        let opened = blob.open()?;
        let mut buffer = opened.data;
        self.cipher
            .decrypt_in_place_detached(
                GenericArray::from_slice(&opened.iv),
                ASSOCIATED_DATA,
                &mut buffer,
                GenericArray::from_slice(&opened.tag),
            )
            .map_err(|_| CipherError::Decryption("authentication failed".to_string()))?;

        let plaintext = String::from_utf8(buffer)
            .map_err(|_| CipherError::Decryption("plaintext is not UTF-8".to_string()))?;
        Ok(SecretString::new(plaintext))
    }

    /// Heuristic: does `value` look like a blob this service produced?
    pub fn is_encrypted_data(value: &str) -> bool {
        super::envelope::is_encrypted_data(value)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Passwords
    // ─────────────────────────────────────────────────────────────────────────

    /// Hashes a password with Argon2id and a random salt (PHC string format).
    pub fn hash_password(&self, password: &str) -> Result<String, CipherError> {
        let params = Params::new(
            self.password_params.memory_kib,
            self.password_params.iterations,
            self.password_params.parallelism,
            None,
        )
        .map_err(|e| CipherError::PasswordHash(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
        let salt = SaltString::generate(&mut OsRng);

        argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CipherError::PasswordHash(e.to_string()))
    }

    /// Verifies a password against a PHC hash. Malformed hashes return false.
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Randomness and fingerprints
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns `length` random bytes, hex-encoded (`2 * length` characters).
    pub fn generate_secure_token(length: usize) -> String {
        let mut bytes = vec![0u8; length];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }

    /// Hex-encoded SHA-256 of `data`. Not for password storage.
    pub fn sha256(data: &[u8]) -> String {
        hex::encode(Sha256::digest(data))
    }
}

impl std::fmt::Debug for CipherService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CipherService")
            .field("key_source", &self.key_source)
            .field("password_params", &self.password_params)
            .finish()
    }
}
