//! Mock payment initiator for testing.
//!
//! Provides a configurable mock implementation of `PaymentInitiator` for unit
//! and integration tests. Supports:
//! - Error injection
//! - Call tracking, keeping the most recent calls only
//! - Artificial latency, to widen race windows

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::ports::{InitiationRequest, InitiationResponse, PaymentInitiator};

/// Recorded initiation call for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiationCall {
    pub provider: String,
    pub reference: String,
    pub amount: i64,
    pub currency: String,
    pub success_url: String,
    pub failure_url: String,
    /// Number of decrypted credential fields supplied.
    pub secret_fields: usize,
}

/// Calls kept for inspection; older ones are only counted.
const RECORDED_CALLS: usize = 256;

#[derive(Default)]
struct MockState {
    calls: VecDeque<InitiationCall>,
    total_calls: usize,
    next_error: Option<DomainError>,
    delay: Option<Duration>,
    link_ttl_minutes: Option<i64>,
}

/// Mock initiator returning a deterministic checkout link per reference.
#[derive(Clone, Default)]
pub struct MockPaymentInitiator {
    inner: Arc<Mutex<MockState>>,
}

impl MockPaymentInitiator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the next call with `UpstreamInitiationFailed`.
    pub async fn fail_next(&self, message: impl Into<String>) {
        self.inner.lock().await.next_error = Some(DomainError::new(
            ErrorCode::UpstreamInitiationFailed,
            message,
        ));
    }

    /// Sleeps this long inside every call.
    pub async fn set_delay(&self, delay: Duration) {
        self.inner.lock().await.delay = Some(delay);
    }

    /// Reports checkout links expiring this many minutes after the call.
    pub async fn set_link_ttl_minutes(&self, minutes: i64) {
        self.inner.lock().await.link_ttl_minutes = Some(minutes);
    }

    /// The most recent calls, oldest first.
    pub async fn calls(&self) -> Vec<InitiationCall> {
        self.inner.lock().await.calls.iter().cloned().collect()
    }

    /// Every call made, including those no longer recorded.
    pub async fn call_count(&self) -> usize {
        self.inner.lock().await.total_calls
    }
}

#[async_trait]
impl PaymentInitiator for MockPaymentInitiator {
    async fn initiate(
        &self,
        request: InitiationRequest,
    ) -> Result<InitiationResponse, DomainError> {
        let (delay, link_ttl) = {
            let mut state = self.inner.lock().await;
            if state.calls.len() == RECORDED_CALLS {
                state.calls.pop_front();
            }
            state.total_calls += 1;
            state.calls.push_back(InitiationCall {
                provider: request.provider.to_string(),
                reference: request.reference.clone(),
                amount: request.amount,
                currency: request.currency.clone(),
                success_url: request.redirects.success_url.clone(),
                failure_url: request.redirects.failure_url.clone(),
                secret_fields: request.secrets.len(),
            });
            if let Some(err) = state.next_error.take() {
                return Err(err);
            }
            (state.delay, state.link_ttl_minutes)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut checkout_links = BTreeMap::new();
        checkout_links.insert(
            "web".to_string(),
            format!("https://pay.{}.test/checkout/{}", request.provider, request.reference),
        );

        Ok(InitiationResponse {
            provider_transaction_id: format!("{}_{}", request.provider, request.reference),
            checkout_links,
            qr_code: None,
            expires_at: link_ttl.map(|minutes| Timestamp::now().plus_minutes(minutes)),
        })
    }
}
