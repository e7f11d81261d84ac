//! In-memory payer repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, PayerId};
use crate::domain::transaction::Payer;
use crate::ports::PayerRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemoryPayerRepository {
    by_phone: Arc<RwLock<HashMap<String, Payer>>>,
}

impl InMemoryPayerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PayerRepository for InMemoryPayerRepository {
    async fn upsert_by_phone(&self, payer: Payer) -> Result<Payer, DomainError> {
        let mut by_phone = self.by_phone.write().await;
        let (name, email) = (payer.name.clone(), payer.email.clone());
        let stored = by_phone
            .entry(payer.phone.clone())
            .and_modify(|existing| existing.merge_details(name, email))
            .or_insert(payer);
        Ok(stored.clone())
    }

    async fn find_by_id(&self, id: &PayerId) -> Result<Option<Payer>, DomainError> {
        Ok(self
            .by_phone
            .read()
            .await
            .values()
            .find(|payer| &payer.id == id)
            .cloned())
    }
}
