//! Data Transfer Objects for session endpoints.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::application::{CheckoutResult, InitiateSessionResult, SessionView, WaitStatusResult};
use crate::domain::foundation::{SessionStatus, Timestamp};
use crate::domain::project::ProviderSummary;
use crate::domain::session::PaymentResult;

// ════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct PayerRequest {
    pub phone: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Request to open a payment session.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionRequest {
    pub project_id: String,
    pub amount: i64,
    pub currency: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub client_reference: Option<String>,
    pub payer: PayerRequest,
    #[serde(default)]
    pub success_url: Option<String>,
    #[serde(default)]
    pub failure_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GetSessionParams {
    #[serde(default)]
    pub include_expired: bool,
}

/// Request to start a charge with one provider.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub provider: String,
    #[serde(default)]
    pub success_url: Option<String>,
    #[serde(default)]
    pub failure_url: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub checkout_url: String,
    pub status: SessionStatus,
    pub expires_at: Timestamp,
}

impl From<InitiateSessionResult> for CreateSessionResponse {
    fn from(result: InitiateSessionResult) -> Self {
        Self {
            session_id: result.session_id.to_string(),
            checkout_url: result.checkout_url,
            status: result.status,
            expires_at: result.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub provider: String,
    pub reference: String,
    pub provider_transaction_id: Option<String>,
    pub checkout_url: Option<String>,
    pub checkout_links: BTreeMap<String, String>,
    pub qr_code: Option<String>,
    pub expires_at: Timestamp,
}

impl From<&PaymentResult> for PaymentResponse {
    fn from(payment: &PaymentResult) -> Self {
        Self {
            provider: payment.provider.to_string(),
            reference: payment.reference.clone(),
            provider_transaction_id: payment.provider_transaction_id.clone(),
            checkout_url: payment.checkout_url().map(str::to_string),
            checkout_links: payment.checkout_links.clone(),
            qr_code: payment.qr_code.clone(),
            expires_at: payment.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub code: String,
    pub name: String,
}

impl From<&ProviderSummary> for ProviderResponse {
    fn from(provider: &ProviderSummary) -> Self {
        Self {
            code: provider.code.to_string(),
            name: provider.name.clone(),
        }
    }
}

/// Session details for the checkout page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub id: String,
    pub project_id: String,
    pub amount: i64,
    pub currency: String,
    pub description: Option<String>,
    pub status: SessionStatus,
    pub expires_at: Timestamp,
    pub payment: Option<PaymentResponse>,
    pub success_url: Option<String>,
    pub failure_url: Option<String>,
    pub providers: Vec<ProviderResponse>,
}

impl From<SessionView> for SessionResponse {
    fn from(view: SessionView) -> Self {
        let session = view.session;
        Self {
            id: session.id().to_string(),
            project_id: session.project_id().to_string(),
            amount: session.amount(),
            currency: session.currency().to_string(),
            description: session.description().map(str::to_string),
            status: session.status(),
            expires_at: *session.expires_at(),
            payment: session.payment().map(PaymentResponse::from),
            success_url: session.redirects().success_url.clone(),
            failure_url: session.redirects().failure_url.clone(),
            providers: view.providers.iter().map(ProviderResponse::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub status: SessionStatus,
    pub reused: bool,
    pub payment: PaymentResponse,
}

impl From<CheckoutResult> for CheckoutResponse {
    fn from(result: CheckoutResult) -> Self {
        Self {
            status: result.status,
            reused: result.reused,
            payment: PaymentResponse::from(&result.payment),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaitStatusResponse {
    pub status: SessionStatus,
    pub redirect_url: Option<String>,
}

impl From<WaitStatusResult> for WaitStatusResponse {
    fn from(result: WaitStatusResult) -> Self {
        Self {
            status: result.status,
            redirect_url: result.redirect_url,
        }
    }
}
