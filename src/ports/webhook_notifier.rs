//! Outbound merchant notification port.

use crate::domain::foundation::DomainError;
use crate::domain::notification::{EventEnvelope, OutboundWebhookEndpoint};
use async_trait::async_trait;
use secrecy::SecretString;

/// Delivers one event to one merchant endpoint.
#[async_trait]
pub trait WebhookNotifier: Send + Sync {
    /// Posts `envelope` to `endpoint`, placing `secret` in the endpoint's
    /// secret header when present.
    ///
    /// Returns the HTTP status the endpoint answered with.
    ///
    /// # Errors
    ///
    /// - `InternalError` on connection failure, timeout or non-2xx answer
    async fn notify(
        &self,
        endpoint: &OutboundWebhookEndpoint,
        secret: Option<&SecretString>,
        envelope: &EventEnvelope,
    ) -> Result<u16, DomainError>;
}
