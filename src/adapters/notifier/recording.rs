//! Recording notifier for tests.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::Mutex;

use crate::domain::foundation::{DomainError, EndpointId, ErrorCode};
use crate::domain::notification::{EventEnvelope, OutboundWebhookEndpoint};
use crate::ports::WebhookNotifier;

/// One captured delivery.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub endpoint_id: EndpointId,
    pub url: String,
    /// Header name and plaintext secret, when the endpoint has one.
    pub secret_header: Option<(String, String)>,
    pub envelope: EventEnvelope,
}

/// Captures every envelope instead of sending it.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    deliveries: Arc<Mutex<Vec<Delivery>>>,
    failing_urls: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliveries to `url` fail after being recorded.
    pub async fn fail_for(&self, url: impl Into<String>) {
        self.failing_urls.lock().await.push(url.into());
    }

    pub async fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().await.clone()
    }

    pub async fn delivery_count(&self) -> usize {
        self.deliveries.lock().await.len()
    }
}

#[async_trait]
impl WebhookNotifier for RecordingNotifier {
    async fn notify(
        &self,
        endpoint: &OutboundWebhookEndpoint,
        secret: Option<&SecretString>,
        envelope: &EventEnvelope,
    ) -> Result<u16, DomainError> {
        self.deliveries.lock().await.push(Delivery {
            endpoint_id: endpoint.id,
            url: endpoint.url.clone(),
            secret_header: secret.map(|s| {
                (
                    endpoint.secret_header().to_string(),
                    s.expose_secret().clone(),
                )
            }),
            envelope: envelope.clone(),
        });

        if self.failing_urls.lock().await.contains(&endpoint.url) {
            return Err(
                DomainError::new(ErrorCode::InternalError, "Webhook endpoint rejected delivery")
                    .with_detail("url", endpoint.url.clone()),
            );
        }
        Ok(200)
    }
}
