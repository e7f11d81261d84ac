//! Transaction aggregate.
//!
//! One attempt at moving money through a specific provider. A transaction
//! leaves `PENDING` at most once; later deliveries for the same reference
//! change nothing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, PayerId, ProjectId, ProviderCode, SessionId, StateMachine, Timestamp,
    TransactionId, TransactionStatus,
};

/// Outcome of applying a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Status moved out of `PENDING`.
    Applied,
    /// Already terminal; nothing changed.
    AlreadyResolved(TransactionStatus),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    /// Gateway-issued reference, unique across all transactions.
    reference: String,
    project_id: ProjectId,
    provider: ProviderCode,
    session_id: Option<SessionId>,
    payer_id: Option<PayerId>,
    amount: i64,
    currency: String,
    status: TransactionStatus,
    provider_transaction_id: Option<String>,
    client_reference: Option<String>,
    resolved_at: Option<Timestamp>,
    created_at: Timestamp,
}

/// Fields for a new pending transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub project_id: ProjectId,
    pub provider: ProviderCode,
    pub session_id: Option<SessionId>,
    pub payer_id: Option<PayerId>,
    pub amount: i64,
    pub currency: String,
    pub client_reference: Option<String>,
}

impl Transaction {
    /// Creates a `PENDING` transaction with a fresh reference.
    pub fn pending(new: NewTransaction) -> Self {
        Self {
            id: TransactionId::new(),
            reference: Self::generate_reference(),
            project_id: new.project_id,
            provider: new.provider,
            session_id: new.session_id,
            payer_id: new.payer_id,
            amount: new.amount,
            currency: new.currency,
            status: TransactionStatus::Pending,
            provider_transaction_id: None,
            client_reference: new.client_reference,
            resolved_at: None,
            created_at: Timestamp::now(),
        }
    }

    /// Reconstitute a transaction from persistence.
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: TransactionId,
        reference: String,
        project_id: ProjectId,
        provider: ProviderCode,
        session_id: Option<SessionId>,
        payer_id: Option<PayerId>,
        amount: i64,
        currency: String,
        status: TransactionStatus,
        provider_transaction_id: Option<String>,
        client_reference: Option<String>,
        resolved_at: Option<Timestamp>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            reference,
            project_id,
            provider,
            session_id,
            payer_id,
            amount,
            currency,
            status,
            provider_transaction_id,
            client_reference,
            resolved_at,
            created_at,
        }
    }

    fn generate_reference() -> String {
        format!("PAY-{}", Uuid::new_v4().simple().to_string().to_ascii_uppercase())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn project_id(&self) -> &ProjectId {
        &self.project_id
    }

    pub fn provider(&self) -> &ProviderCode {
        &self.provider
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn payer_id(&self) -> Option<&PayerId> {
        self.payer_id.as_ref()
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    pub fn provider_transaction_id(&self) -> Option<&str> {
        self.provider_transaction_id.as_deref()
    }

    pub fn client_reference(&self) -> Option<&str> {
        self.client_reference.as_deref()
    }

    pub fn resolved_at(&self) -> Option<&Timestamp> {
        self.resolved_at.as_ref()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Records the id the provider assigned at initiation.
    pub fn record_provider_transaction_id(&mut self, provider_transaction_id: impl Into<String>) {
        self.provider_transaction_id = Some(provider_transaction_id.into());
    }

    /// Moves a pending transaction to a terminal status and stamps `resolved_at`.
    ///
    /// # Errors
    ///
    /// - `InvalidStateTransition` if `status` is `PENDING`
    pub fn resolve(
        &mut self,
        status: TransactionStatus,
        now: Timestamp,
    ) -> Result<Resolution, DomainError> {
        if status == TransactionStatus::Pending {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "A transaction cannot be resolved to PENDING",
            ));
        }
        if self.status.is_terminal() {
            return Ok(Resolution::AlreadyResolved(self.status));
        }

        self.status = self.status.transition_to(status)?;
        self.resolved_at = Some(now);
        Ok(Resolution::Applied)
    }
}
