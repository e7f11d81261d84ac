//! In-memory project catalog.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ProjectId, ProviderCode};
use crate::domain::project::{Project, Provider};
use crate::ports::ProjectCatalog;

/// Projects and providers seeded by tests or local setup.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProjectCatalog {
    projects: Arc<RwLock<HashMap<ProjectId, Project>>>,
    providers: Arc<RwLock<Vec<Provider>>>,
}

impl InMemoryProjectCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_project(&self, project: Project) {
        self.projects.write().await.insert(project.id, project);
    }

    /// Adds or replaces the provider with the same project and code.
    pub async fn add_provider(&self, provider: Provider) {
        let mut providers = self.providers.write().await;
        providers.retain(|p| !(p.project_id == provider.project_id && p.code == provider.code));
        providers.push(provider);
        providers.sort_by(|a, b| a.code.as_str().cmp(b.code.as_str()));
    }
}

#[async_trait]
impl ProjectCatalog for InMemoryProjectCatalog {
    async fn find_project(&self, id: &ProjectId) -> Result<Option<Project>, DomainError> {
        Ok(self.projects.read().await.get(id).cloned())
    }

    async fn active_providers(&self, project_id: &ProjectId) -> Result<Vec<Provider>, DomainError> {
        Ok(self
            .providers
            .read()
            .await
            .iter()
            .filter(|p| &p.project_id == project_id && p.active)
            .cloned()
            .collect())
    }

    async fn find_provider(
        &self,
        project_id: &ProjectId,
        code: &ProviderCode,
    ) -> Result<Option<Provider>, DomainError> {
        Ok(self
            .providers
            .read()
            .await
            .iter()
            .find(|p| &p.project_id == project_id && &p.code == code)
            .cloned())
    }

    async fn providers_by_code(&self, code: &ProviderCode) -> Result<Vec<Provider>, DomainError> {
        Ok(self
            .providers
            .read()
            .await
            .iter()
            .filter(|p| &p.code == code && p.active)
            .cloned()
            .collect())
    }
}
