//! Project and provider lookup port.
//!
//! Read-only. Administrative CRUD for projects and providers happens
//! elsewhere; the core only needs to know what exists and what is active.

use crate::domain::foundation::{DomainError, ProjectId, ProviderCode};
use crate::domain::project::{Project, Provider};
use async_trait::async_trait;

#[async_trait]
pub trait ProjectCatalog: Send + Sync {
    async fn find_project(&self, id: &ProjectId) -> Result<Option<Project>, DomainError>;

    /// Providers enabled for the project, ordered by code.
    async fn active_providers(&self, project_id: &ProjectId) -> Result<Vec<Provider>, DomainError>;

    /// One provider of a project, active or not.
    async fn find_provider(
        &self,
        project_id: &ProjectId,
        code: &ProviderCode,
    ) -> Result<Option<Provider>, DomainError>;

    /// Every active provider registered under `code`, across projects.
    ///
    /// Used to route inbound callbacks that only name the provider.
    async fn providers_by_code(&self, code: &ProviderCode) -> Result<Vec<Provider>, DomainError>;
}
