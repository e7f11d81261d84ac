//! HTTP payment initiator.
//!
//! Each provider is served by a connector deployed next to the gateway.
//! The gateway POSTs one JSON request per charge to the connector configured
//! for the provider code and expects the checkout links back.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::foundation::{DomainError, ErrorCode, ProviderCode, Timestamp};
use crate::ports::{InitiationRequest, InitiationResponse, PaymentInitiator};

/// Body sent to a provider connector.
#[derive(Debug, Serialize)]
struct ConnectorRequest<'a> {
    provider: &'a str,
    amount: i64,
    currency: &'a str,
    reference: &'a str,
    payer_phone: Option<&'a str>,
    credentials: BTreeMap<&'a str, &'a str>,
    success_url: &'a str,
    failure_url: &'a str,
}

/// Body a connector answers with.
#[derive(Debug, Deserialize)]
struct ConnectorResponse {
    provider_transaction_id: String,
    #[serde(default)]
    checkout_links: BTreeMap<String, String>,
    #[serde(default)]
    qr_code: Option<String>,
    #[serde(default)]
    expires_at: Option<Timestamp>,
}

/// Starts charges through per-provider HTTP connectors.
#[derive(Debug, Clone)]
pub struct HttpPaymentInitiator {
    client: Client,
    endpoints: HashMap<String, String>,
}

impl HttpPaymentInitiator {
    /// Create an initiator whose requests give up after `timeout`.
    ///
    /// `endpoints` maps a provider code to its connector URL.
    pub fn new(endpoints: HashMap<String, String>, timeout: Duration) -> Result<Self, DomainError> {
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
        let endpoints = endpoints
            .into_iter()
            .map(|(code, url)| (code.trim().to_ascii_lowercase(), url))
            .collect();
        Ok(Self { client, endpoints })
    }

    fn endpoint_for(&self, provider: &ProviderCode) -> Result<&str, DomainError> {
        self.endpoints
            .get(provider.as_str())
            .map(String::as_str)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::UpstreamInitiationFailed,
                    format!("No initiation endpoint configured for provider {}", provider),
                )
            })
    }
}

fn upstream_error(message: impl Into<String>, url: &str) -> DomainError {
    DomainError::new(ErrorCode::UpstreamInitiationFailed, message).with_detail("url", url.to_string())
}

#[async_trait]
impl PaymentInitiator for HttpPaymentInitiator {
    async fn initiate(
        &self,
        request: InitiationRequest,
    ) -> Result<InitiationResponse, DomainError> {
        let url = self.endpoint_for(&request.provider)?;
        let body = ConnectorRequest {
            provider: request.provider.as_str(),
            amount: request.amount,
            currency: &request.currency,
            reference: &request.reference,
            payer_phone: request.payer_phone.as_deref(),
            credentials: request.secrets.iter().collect(),
            success_url: &request.redirects.success_url,
            failure_url: &request.redirects.failure_url,
        };

        debug!(provider = %request.provider, reference = %request.reference, "Initiating charge");
        let start = Instant::now();

        let response = self.client.post(url).json(&body).send().await.map_err(|e| {
            warn!(provider = %request.provider, error = %e, "Initiation request failed");
            upstream_error("Provider connector unreachable", url).with_detail("reason", e.to_string())
        })?;

        let status = response.status();
        debug!(
            provider = %request.provider,
            status = status.as_u16(),
            response_time_ms = start.elapsed().as_millis() as u64,
            "Initiation response received"
        );
        if !status.is_success() {
            return Err(upstream_error("Provider rejected the charge", url)
                .with_detail("status", status.as_u16().to_string()));
        }

        let parsed: ConnectorResponse = response.json().await.map_err(|e| {
            upstream_error("Provider connector sent an unreadable answer", url)
                .with_detail("reason", e.to_string())
        })?;

        Ok(InitiationResponse {
            provider_transaction_id: parsed.provider_transaction_id,
            checkout_links: parsed.checkout_links,
            qr_code: parsed.qr_code,
            expires_at: parsed.expires_at,
        })
    }
}
