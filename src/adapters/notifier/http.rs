//! HTTP delivery of outbound event envelopes.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::notification::{EventEnvelope, OutboundWebhookEndpoint};
use crate::ports::WebhookNotifier;

/// POSTs envelopes as JSON to project endpoints.
#[derive(Debug, Clone)]
pub struct HttpWebhookNotifier {
    client: Client,
}

impl HttpWebhookNotifier {
    /// Create a notifier whose requests give up after `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self, DomainError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("paygate/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::InternalError,
                    format!("Failed to build HTTP client: {}", e),
                )
            })?;
        Ok(Self { client })
    }
}

#[async_trait]
impl WebhookNotifier for HttpWebhookNotifier {
    async fn notify(
        &self,
        endpoint: &OutboundWebhookEndpoint,
        secret: Option<&SecretString>,
        envelope: &EventEnvelope,
    ) -> Result<u16, DomainError> {
        debug!(url = %endpoint.url, event = %envelope.event_type, "Sending webhook");
        let start = Instant::now();

        let mut request = self.client.post(&endpoint.url).json(envelope);
        if let Some(secret) = secret {
            request = request.header(endpoint.secret_header(), secret.expose_secret().as_str());
        }

        let response = request.send().await.map_err(|e| {
            warn!(url = %endpoint.url, error = %e, "Webhook request failed");
            DomainError::new(ErrorCode::InternalError, "Webhook delivery failed")
                .with_detail("url", endpoint.url.clone())
                .with_detail("reason", e.to_string())
        })?;

        let status = response.status();
        debug!(
            url = %endpoint.url,
            status = status.as_u16(),
            response_time_ms = start.elapsed().as_millis() as u64,
            "Webhook response received"
        );

        if !status.is_success() {
            return Err(
                DomainError::new(ErrorCode::InternalError, "Webhook endpoint rejected delivery")
                    .with_detail("url", endpoint.url.clone())
                    .with_detail("status", status.as_u16().to_string()),
            );
        }

        Ok(status.as_u16())
    }
}
