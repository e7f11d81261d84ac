//! Session aggregate entity.
//!
//! A session is one checkout attempt by one payer. It is created without
//! contacting any provider, moves to `pending` once a charge is started,
//! and ends in one terminal status. Sessions are never deleted.
//!
//! # Expiry
//!
//! Expiry is evaluated lazily: nothing sweeps sessions in the background.
//! Readers call [`Session::expire_if_due`] and persist the change they observe.

use serde::{Deserialize, Serialize};

use super::errors::SessionError;
use super::payment::{PaymentResult, RedirectUrls, ResolvedRedirects};
use crate::domain::foundation::{
    PayerId, ProjectId, ProviderCode, SessionId, SessionStatus, StateMachine, Timestamp,
};

/// Fields supplied when a session is opened.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub project_id: ProjectId,
    pub payer_id: PayerId,
    pub amount: i64,
    pub currency: String,
    pub description: Option<String>,
    pub client_reference: Option<String>,
    pub redirects: RedirectUrls,
}

/// Session aggregate - one checkout attempt.
///
/// # Invariants
///
/// - `amount` is positive
/// - `currency` is a three-letter uppercase code
/// - status never moves backward
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    id: SessionId,
    project_id: ProjectId,
    payer_id: PayerId,
    amount: i64,
    currency: String,
    description: Option<String>,
    client_reference: Option<String>,
    status: SessionStatus,
    expires_at: Timestamp,
    payment: Option<PaymentResult>,
    /// Redirects supplied by the merchant, at open or at checkout.
    redirects: RedirectUrls,
    /// Redirects handed to the provider for the current charge.
    resolved_redirects: Option<ResolvedRedirects>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl Session {
    /// Opens a session expiring `ttl_minutes` after `now`.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if amount or currency is invalid
    pub fn open(new: NewSession, ttl_minutes: i64, now: Timestamp) -> Result<Self, SessionError> {
        if new.amount <= 0 {
            return Err(SessionError::validation("amount", "must be positive"));
        }
        let currency = new.currency.trim().to_ascii_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(SessionError::validation(
                "currency",
                "must be a three-letter code",
            ));
        }

        Ok(Self {
            id: SessionId::new(),
            project_id: new.project_id,
            payer_id: new.payer_id,
            amount: new.amount,
            currency,
            description: new.description,
            client_reference: new.client_reference,
            status: SessionStatus::Opened,
            expires_at: now.plus_minutes(ttl_minutes),
            payment: None,
            redirects: new.redirects,
            resolved_redirects: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Reconstitute a session from persistence (no validation).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: SessionId,
        project_id: ProjectId,
        payer_id: PayerId,
        amount: i64,
        currency: String,
        description: Option<String>,
        client_reference: Option<String>,
        status: SessionStatus,
        expires_at: Timestamp,
        payment: Option<PaymentResult>,
        redirects: RedirectUrls,
        resolved_redirects: Option<ResolvedRedirects>,
        created_at: Timestamp,
        updated_at: Timestamp,
    ) -> Self {
        Self {
            id,
            project_id,
            payer_id,
            amount,
            currency,
            description,
            client_reference,
            status,
            expires_at,
            payment,
            redirects,
            resolved_redirects,
            created_at,
            updated_at,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn payer_id(&self) -> &PayerId {
        &self.payer_id
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn client_reference(&self) -> Option<&str> {
        self.client_reference.as_deref()
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn expires_at(&self) -> &Timestamp {
        &self.expires_at
    }

    /// Cached payment-initiation result, if any.
    pub fn payment(&self) -> Option<&PaymentResult> {
        self.payment.as_ref()
    }

    pub fn redirects(&self) -> &RedirectUrls {
        &self.redirects
    }

    pub fn resolved_redirects(&self) -> Option<&ResolvedRedirects> {
        self.resolved_redirects.as_ref()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expiry
    // ─────────────────────────────────────────────────────────────────────────

    /// True if the session is expired, or would be once `expire_if_due` runs.
    pub fn is_expired(&self, now: &Timestamp) -> bool {
        self.status == SessionStatus::Expired
            || (!self.status.is_terminal() && self.expires_at.has_passed(now))
    }

    /// Moves a non-terminal session past its deadline to `expired`.
    ///
    /// Returns true if the status changed and must be persisted.
    pub fn expire_if_due(&mut self, now: Timestamp) -> bool {
        if self.status.is_terminal() || !self.expires_at.has_passed(&now) {
            return false;
        }
        self.status = SessionStatus::Expired;
        self.updated_at = now;
        true
    }

    /// Drops a cached payment result whose own expiry has passed.
    ///
    /// Returns true if the cache was cleared and must be persisted.
    pub fn clear_stale_payment(&mut self, now: Timestamp) -> bool {
        let stale = self
            .payment
            .as_ref()
            .map_or(false, |payment| payment.is_expired(&now));
        if stale {
            self.payment = None;
            self.updated_at = now;
        }
        stale
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Checkout
    // ─────────────────────────────────────────────────────────────────────────

    /// Cached result that can be returned again for `provider`.
    pub fn reusable_payment(&self, provider: &ProviderCode, now: &Timestamp) -> Option<&PaymentResult> {
        self.payment
            .as_ref()
            .filter(|payment| payment.is_reusable_for(provider, now))
    }

    /// Checks that a new charge may be started.
    ///
    /// # Errors
    ///
    /// - `Expired` if the deadline has passed
    /// - `InvalidState` if the session already reached a terminal status
    pub fn ensure_checkout_allowed(&self, now: &Timestamp) -> Result<(), SessionError> {
        if self.is_expired(now) {
            return Err(SessionError::Expired(self.id));
        }
        if self.status.is_terminal() {
            return Err(SessionError::invalid_state(format!(
                "session is already {}",
                self.status
            )));
        }
        Ok(())
    }

    /// Stores the provider's result and moves the session to `pending`.
    ///
    /// `resolved` is kept apart from the session's own redirects, which a
    /// later checkout resolves against the defaults again.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if the session is terminal
    pub fn attach_payment(
        &mut self,
        payment: PaymentResult,
        resolved: ResolvedRedirects,
        now: Timestamp,
    ) -> Result<(), SessionError> {
        if self.status == SessionStatus::Opened {
            self.status = self.transition(SessionStatus::Pending)?;
        } else if self.status != SessionStatus::Pending {
            return Err(SessionError::invalid_state(format!(
                "cannot attach a payment to a {} session",
                self.status
            )));
        }

        self.payment = Some(payment);
        self.resolved_redirects = Some(resolved);
        self.updated_at = now;
        Ok(())
    }

    /// Marks the session `pending` ahead of the provider call.
    pub fn mark_pending(&mut self, now: Timestamp) -> Result<(), SessionError> {
        if self.status != SessionStatus::Pending {
            self.advance(SessionStatus::Pending, now)?;
        }
        Ok(())
    }

    /// Moves to `to` along a valid transition.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if `to` is not reachable from the current status
    pub fn advance(&mut self, to: SessionStatus, now: Timestamp) -> Result<(), SessionError> {
        self.status = self.transition(to)?;
        self.updated_at = now;
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reconciliation
    // ─────────────────────────────────────────────────────────────────────────

    /// Cascades a transaction outcome onto the session.
    ///
    /// Returns false when the session is already terminal; the outcome is
    /// then ignored rather than rejected.
    ///
    /// # Errors
    ///
    /// - `InvalidState` if `outcome` is not reachable from the current status
    pub fn apply_outcome(
        &mut self,
        outcome: SessionStatus,
        now: Timestamp,
    ) -> Result<bool, SessionError> {
        if self.status.is_terminal() {
            return Ok(false);
        }
        self.advance(outcome, now)?;
        Ok(true)
    }

    fn transition(&self, target: SessionStatus) -> Result<SessionStatus, SessionError> {
        self.status
            .transition_to(target)
            .map_err(|e| SessionError::invalid_state(e.to_string()))
    }

    /// True when an outcome for transaction `reference` should reach the session.
    ///
    /// A success always does: money moved, whichever charge it came from.
    /// A failure only counts for the charge behind the cached payment result,
    /// so a late failure of a replaced charge cannot end the session.
    pub fn is_governed_by(&self, reference: &str, outcome: SessionStatus) -> bool {
        if outcome == SessionStatus::Closed {
            return true;
        }
        self.payment
            .as_ref()
            .map_or(false, |payment| payment.reference == reference)
    }

    /// Where to send the payer for the current status.
    pub fn redirect_url(&self) -> Option<&str> {
        let resolved = self.resolved_redirects.as_ref();
        match self.status {
            SessionStatus::Completed | SessionStatus::Closed => resolved
                .map(|r| r.success_url.as_str())
                .or(self.redirects.success_url.as_deref()),
            SessionStatus::Failed | SessionStatus::Expired => resolved
                .map(|r| r.failure_url.as_str())
                .or(self.redirects.failure_url.as_deref()),
            SessionStatus::Opened | SessionStatus::Pending => None,
        }
    }
}
