//! Cached payment-initiation results and redirect targets.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ProviderCode, Timestamp};

/// What a provider returned when a charge was started.
///
/// Cached on the session so that a reload or double click returns the same
/// result instead of starting a second charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentResult {
    pub provider: ProviderCode,
    /// Gateway transaction reference the provider will call back with.
    pub reference: String,
    pub provider_transaction_id: Option<String>,
    /// Named links, e.g. `web` or `deeplink`.
    pub checkout_links: BTreeMap<String, String>,
    pub qr_code: Option<String>,
    pub expires_at: Timestamp,
}

impl PaymentResult {
    pub fn is_expired(&self, now: &Timestamp) -> bool {
        self.expires_at.has_passed(now)
    }

    /// True when this result may be handed out again for `provider`.
    pub fn is_reusable_for(&self, provider: &ProviderCode, now: &Timestamp) -> bool {
        &self.provider == provider && !self.is_expired(now)
    }

    /// Preferred link to send the payer to.
    pub fn checkout_url(&self) -> Option<&str> {
        self.checkout_links
            .get("web")
            .or_else(|| self.checkout_links.values().next())
            .map(String::as_str)
    }
}

/// Optional redirect targets supplied at one layer of configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectUrls {
    pub success_url: Option<String>,
    pub failure_url: Option<String>,
}

impl RedirectUrls {
    pub fn new(success_url: Option<String>, failure_url: Option<String>) -> Self {
        Self {
            success_url: success_url.filter(|u| !u.trim().is_empty()),
            failure_url: failure_url.filter(|u| !u.trim().is_empty()),
        }
    }

    /// Fills gaps in `self` from `fallback`.
    pub fn or(self, fallback: RedirectUrls) -> RedirectUrls {
        RedirectUrls {
            success_url: self.success_url.or(fallback.success_url),
            failure_url: self.failure_url.or(fallback.failure_url),
        }
    }

    /// Final fallback layer; both targets are always set afterwards.
    pub fn resolve(self, system_success: &str, system_failure: &str) -> ResolvedRedirects {
        ResolvedRedirects {
            success_url: self
                .success_url
                .unwrap_or_else(|| system_success.to_string()),
            failure_url: self
                .failure_url
                .unwrap_or_else(|| system_failure.to_string()),
        }
    }
}

/// Redirect targets after precedence has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRedirects {
    pub success_url: String,
    pub failure_url: String,
}
