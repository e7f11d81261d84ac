//! Encrypted provider credential sets.

use std::collections::BTreeMap;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::cipher::{CipherError, CipherService, EncryptedBlob};
use crate::domain::foundation::{DomainError, ErrorCode};

/// Named provider credentials, every value an [`EncryptedBlob`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedSecretSet(BTreeMap<String, EncryptedBlob>);

impl EncryptedSecretSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a set from stored values without re-encrypting.
    pub fn from_stored(values: BTreeMap<String, EncryptedBlob>) -> Self {
        Self(values)
    }

    pub fn get(&self, field: &str) -> Option<&EncryptedBlob> {
        self.0.get(field)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Applies a partial update from an operator.
    ///
    /// - A value that is already an encrypted envelope is carried over as-is.
    /// - Any other non-blank value is plaintext and gets encrypted.
    /// - Blank values and fields absent from `updates` keep their stored value.
    ///
    /// # Errors
    ///
    /// `Encryption` if a plaintext value cannot be encrypted. Nothing is
    /// changed in that case.
    pub fn merge_update(
        &self,
        updates: BTreeMap<String, String>,
        cipher: &CipherService,
    ) -> Result<Self, CipherError> {
        let mut merged = self.0.clone();
        for (field, value) in updates {
            if value.trim().is_empty() {
                continue;
            }
            let blob = if CipherService::is_encrypted_data(&value) {
                EncryptedBlob::from_stored(value)
            } else {
                cipher.encrypt(&value)?
            };
            merged.insert(field, blob);
        }
        Ok(Self(merged))
    }

    /// Decrypts the required fields after checking that all of them exist.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` naming the first missing field; nothing is
    ///   decrypted in that case
    /// - `DecryptionFailed` if a stored value cannot be opened
    pub fn decrypt_required(
        &self,
        required: &[String],
        cipher: &CipherService,
    ) -> Result<DecryptedSecrets, DomainError> {
        if let Some(missing) = required.iter().find(|field| !self.0.contains_key(*field)) {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                format!("Provider secret '{}' is not configured", missing),
            )
            .with_detail("field", missing.clone()));
        }

        let mut values = BTreeMap::new();
        for field in required {
            if let Some(blob) = self.0.get(field) {
                let plaintext = cipher
                    .decrypt(blob)
                    .map_err(|e| DomainError::from(e).with_detail("field", field.clone()))?;
                values.insert(field.clone(), plaintext);
            }
        }
        Ok(DecryptedSecrets(values))
    }
}

/// Plaintext credentials, held only for the duration of one upstream call.
#[derive(Clone, Default)]
pub struct DecryptedSecrets(BTreeMap<String, SecretString>);

impl DecryptedSecrets {
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(|s| s.expose_secret().as_str())
    }

    /// Field names with their plaintext values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .map(|(field, value)| (field.as_str(), value.expose_secret().as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for DecryptedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.0.keys()).finish()
    }
}
