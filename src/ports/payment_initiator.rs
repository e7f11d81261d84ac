//! Payment initiation port.
//!
//! Implemented once per provider outside the core. The core calls this
//! abstraction to start a provider-side charge and persists what it returns.
//!
//! # Design
//!
//! - **Provider agnostic**: credentials arrive already decrypted
//! - **Bounded**: implementations must apply an explicit request timeout

use std::collections::BTreeMap;

use crate::domain::foundation::{DomainError, ProviderCode, Timestamp};
use crate::domain::project::DecryptedSecrets;
use crate::domain::session::ResolvedRedirects;
use async_trait::async_trait;

/// Port for starting a charge with a mobile-money provider.
#[async_trait]
pub trait PaymentInitiator: Send + Sync {
    /// Starts the provider-side charge.
    ///
    /// # Errors
    ///
    /// - `UpstreamInitiationFailed` if the provider rejects the request,
    ///   responds with an error, or times out
    async fn initiate(&self, request: InitiationRequest)
        -> Result<InitiationResponse, DomainError>;
}

/// Everything a provider needs to start a charge.
#[derive(Debug, Clone)]
pub struct InitiationRequest {
    pub provider: ProviderCode,
    pub amount: i64,
    pub currency: String,
    /// Gateway reference the provider echoes back in callbacks.
    pub reference: String,
    pub payer_phone: Option<String>,
    pub secrets: DecryptedSecrets,
    pub redirects: ResolvedRedirects,
}

/// What the provider returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiationResponse {
    pub provider_transaction_id: String,
    pub checkout_links: BTreeMap<String, String>,
    pub qr_code: Option<String>,
    /// Provider-side expiry of the checkout links, if it reports one.
    pub expires_at: Option<Timestamp>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payment_initiator_is_object_safe() {
        fn _accepts_dyn(_initiator: &dyn PaymentInitiator) {}
    }
}
