//! Transaction repository port.
//!
//! The PENDING-only guard lives at this boundary: `update_status` never
//! overwrites a transaction that has already been resolved.

use crate::domain::foundation::{DomainError, Timestamp, TransactionStatus};
use crate::domain::transaction::Transaction;
use async_trait::async_trait;

/// Repository port for Transaction persistence.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Save a new transaction.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure or duplicate reference
    async fn save(&self, transaction: &Transaction) -> Result<(), DomainError>;

    /// Find a transaction by its gateway reference.
    async fn find_by_reference(&self, reference: &str)
        -> Result<Option<Transaction>, DomainError>;

    /// Records the id the provider assigned at initiation.
    ///
    /// # Errors
    ///
    /// - `TransactionNotFound` if no transaction has this reference
    async fn record_provider_transaction_id(
        &self,
        reference: &str,
        provider_transaction_id: &str,
    ) -> Result<(), DomainError>;

    /// Moves a `PENDING` transaction to `status` and stamps `resolved_at`.
    ///
    /// Returns false if the transaction was no longer `PENDING`; nothing is
    /// written in that case.
    async fn update_status(
        &self,
        reference: &str,
        status: TransactionStatus,
        resolved_at: Timestamp,
    ) -> Result<bool, DomainError>;
}
