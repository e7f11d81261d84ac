//! Outbound webhook endpoint repository port.

use crate::domain::foundation::{DomainError, ProjectId};
use crate::domain::notification::OutboundWebhookEndpoint;
use async_trait::async_trait;

#[async_trait]
pub trait WebhookEndpointRepository: Send + Sync {
    async fn save(&self, endpoint: &OutboundWebhookEndpoint) -> Result<(), DomainError>;

    /// Active endpoints of a project.
    async fn find_active_by_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<OutboundWebhookEndpoint>, DomainError>;
}
