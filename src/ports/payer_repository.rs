//! Payer repository port.

use crate::domain::foundation::{DomainError, PayerId};
use crate::domain::transaction::Payer;
use async_trait::async_trait;

#[async_trait]
pub trait PayerRepository: Send + Sync {
    /// Inserts the payer, or merges details into the existing record with
    /// the same phone number. Returns the stored payer.
    async fn upsert_by_phone(&self, payer: Payer) -> Result<Payer, DomainError>;

    async fn find_by_id(&self, id: &PayerId) -> Result<Option<Payer>, DomainError>;
}
