//! PostgreSQL implementation of ProjectCatalog.
//!
//! Secret sets, webhook configs and callback mappings are JSONB columns.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use super::{column, corrupt, db_error};
use crate::domain::foundation::{DomainError, ProjectId, ProviderCode};
use crate::domain::project::{EncryptedSecretSet, Project, Provider};
use crate::domain::webhook::{GenericCallbackMapper, ProviderWebhookConfig};
use crate::ports::ProjectCatalog;

/// Read-only catalog of projects and their providers.
#[derive(Clone)]
pub struct PostgresProjectCatalog {
    pool: PgPool,
}

impl PostgresProjectCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProjectCatalog for PostgresProjectCatalog {
    async fn find_project(&self, id: &ProjectId) -> Result<Option<Project>, DomainError> {
        let row = sqlx::query(
            "SELECT id, name, default_success_url, default_failure_url FROM projects WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch project"))?;

        row.map(|row| {
            Ok(Project {
                id: ProjectId::from_uuid(column(&row, "id")?),
                name: column(&row, "name")?,
                default_success_url: column(&row, "default_success_url")?,
                default_failure_url: column(&row, "default_failure_url")?,
            })
        })
        .transpose()
    }

    async fn active_providers(&self, project_id: &ProjectId) -> Result<Vec<Provider>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT project_id, code, name, active, required_secret_fields,
                   secrets, webhook, callback_mapping
            FROM providers
            WHERE project_id = $1 AND active
            ORDER BY code
            "#,
        )
        .bind(project_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch active providers"))?;

        rows.into_iter().map(row_to_provider).collect()
    }

    async fn find_provider(
        &self,
        project_id: &ProjectId,
        code: &ProviderCode,
    ) -> Result<Option<Provider>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT project_id, code, name, active, required_secret_fields,
                   secrets, webhook, callback_mapping
            FROM providers
            WHERE project_id = $1 AND code = $2
            "#,
        )
        .bind(project_id.as_uuid())
        .bind(code.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch provider"))?;

        row.map(row_to_provider).transpose()
    }

    async fn providers_by_code(&self, code: &ProviderCode) -> Result<Vec<Provider>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT project_id, code, name, active, required_secret_fields,
                   secrets, webhook, callback_mapping
            FROM providers
            WHERE code = $1
            ORDER BY project_id
            "#,
        )
        .bind(code.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("fetch providers by code"))?;

        rows.into_iter().map(row_to_provider).collect()
    }
}

fn row_to_provider(row: sqlx::postgres::PgRow) -> Result<Provider, DomainError> {
    let code: String = column(&row, "code")?;
    let secrets: Json<EncryptedSecretSet> = column(&row, "secrets")?;
    let webhook: Option<Json<ProviderWebhookConfig>> = column(&row, "webhook")?;
    let mapping: Json<GenericCallbackMapper> = column(&row, "callback_mapping")?;

    Ok(Provider {
        project_id: ProjectId::from_uuid(column(&row, "project_id")?),
        code: ProviderCode::new(code).map_err(|e| corrupt("provider code", e))?,
        name: column(&row, "name")?,
        active: column(&row, "active")?,
        required_secret_fields: column(&row, "required_secret_fields")?,
        secrets: secrets.0,
        webhook: webhook.map(|Json(config)| config),
        callback_mapping: mapping.0,
    })
}
