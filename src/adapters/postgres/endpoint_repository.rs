//! PostgreSQL implementation of WebhookEndpointRepository.

use async_trait::async_trait;
use sqlx::PgPool;

use super::{column, db_error};
use crate::domain::cipher::EncryptedBlob;
use crate::domain::foundation::{DomainError, EndpointId, ProjectId};
use crate::domain::notification::OutboundWebhookEndpoint;
use crate::ports::WebhookEndpointRepository;

#[derive(Clone)]
pub struct PostgresWebhookEndpointRepository {
    pool: PgPool,
}

impl PostgresWebhookEndpointRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebhookEndpointRepository for PostgresWebhookEndpointRepository {
    async fn save(&self, endpoint: &OutboundWebhookEndpoint) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO webhook_endpoints (id, project_id, url, header_name, secret, active)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id) DO UPDATE SET
                url = EXCLUDED.url,
                header_name = EXCLUDED.header_name,
                secret = EXCLUDED.secret,
                active = EXCLUDED.active
            "#,
        )
        .bind(endpoint.id.as_uuid())
        .bind(endpoint.project_id.as_uuid())
        .bind(&endpoint.url)
        .bind(endpoint.header_name.as_deref())
        .bind(endpoint.secret.as_ref().map(EncryptedBlob::as_str))
        .bind(endpoint.active)
        .execute(&self.pool)
        .await
        .map_err(db_error("save webhook endpoint"))?;

        Ok(())
    }

    async fn find_active_by_project(
        &self,
        project_id: &ProjectId,
    ) -> Result<Vec<OutboundWebhookEndpoint>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, project_id, url, header_name, secret, active
            FROM webhook_endpoints
            WHERE project_id = $1 AND active
            "#,
        )
        .bind(project_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch webhook endpoints"))?;

        rows.into_iter()
            .map(|row| {
                let secret: Option<String> = column(&row, "secret")?;
                Ok(OutboundWebhookEndpoint {
                    id: EndpointId::from_uuid(column(&row, "id")?),
                    project_id: ProjectId::from_uuid(column(&row, "project_id")?),
                    url: column(&row, "url")?,
                    header_name: column(&row, "header_name")?,
                    secret: secret.map(EncryptedBlob::from_stored),
                    active: column(&row, "active")?,
                })
            })
            .collect()
    }
}
