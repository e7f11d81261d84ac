//! In-memory outbound endpoint repository.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ProjectId};
use crate::domain::notification::OutboundWebhookEndpoint;
use crate::ports::WebhookEndpointRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemoryWebhookEndpointRepository {
    endpoints: Arc<RwLock<Vec<OutboundWebhookEndpoint>>>,
}

impl InMemoryWebhookEndpointRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl WebhookEndpointRepository for InMemoryWebhookEndpointRepository {
    async fn save(&self, endpoint: &OutboundWebhookEndpoint) -> Result<(), DomainError> {
        let mut endpoints = self.endpoints.write().await;
        endpoints.retain(|e| e.id != endpoint.id);
        endpoints.push(endpoint.clone());
        Ok(())
    }

    async fn find_active_by_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<OutboundWebhookEndpoint>, DomainError> {
        Ok(self
            .endpoints
            .read()
            .await
            .iter()
            .filter(|e| &e.project_id == project_id && e.active)
            .cloned()
            .collect())
    }
}
