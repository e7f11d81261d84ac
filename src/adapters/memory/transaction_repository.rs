//! In-memory transaction repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, TransactionStatus};
use crate::domain::transaction::{Resolution, Transaction};
use crate::ports::TransactionRepository;

/// Transactions keyed by reference.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTransactionRepository {
    transactions: Arc<RwLock<HashMap<String, Transaction>>>,
    status_writes: Arc<AtomicUsize>,
}

impl InMemoryTransactionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of status updates that actually changed a row.
    pub fn status_write_count(&self) -> usize {
        self.status_writes.load(Ordering::SeqCst)
    }

    pub async fn all(&self) -> Vec<Transaction> {
        self.transactions.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl TransactionRepository for InMemoryTransactionRepository {
    async fn save(&self, transaction: &Transaction) -> Result<(), DomainError> {
        let mut transactions = self.transactions.write().await;
        if transactions.contains_key(transaction.reference()) {
            return Err(DomainError::database("duplicate transaction reference")
                .with_detail("reference", transaction.reference()));
        }
        transactions.insert(transaction.reference().to_string(), transaction.clone());
        Ok(())
    }

    async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transaction>, DomainError> {
        Ok(self.transactions.read().await.get(reference).cloned())
    }

    async fn record_provider_transaction_id(
        &self,
        reference: &str,
        provider_transaction_id: &str,
    ) -> Result<(), DomainError> {
        let mut transactions = self.transactions.write().await;
        let transaction = transactions.get_mut(reference).ok_or_else(|| {
            DomainError::new(ErrorCode::TransactionNotFound, "Transaction not found")
                .with_detail("reference", reference)
        })?;
        transaction.record_provider_transaction_id(provider_transaction_id);
        Ok(())
    }

    async fn update_status(
        &self,
        reference: &str,
        status: TransactionStatus,
        resolved_at: Timestamp,
    ) -> Result<bool, DomainError> {
        let mut transactions = self.transactions.write().await;
        let Some(transaction) = transactions.get_mut(reference) else {
            return Ok(false);
        };
        match transaction.resolve(status, resolved_at)? {
            Resolution::Applied => {
                self.status_writes.fetch_add(1, Ordering::SeqCst);
                Ok(true)
            }
            Resolution::AlreadyResolved(_) => Ok(false),
        }
    }
}
