//! Project module - Merchant projects, providers and their credentials.

mod aggregate;
mod secrets;

pub use aggregate::{Project, Provider, ProviderSummary};
pub use secrets::{DecryptedSecrets, EncryptedSecretSet};
