//! Merchant projects and the providers enabled for them.

use serde::{Deserialize, Serialize};

use super::secrets::EncryptedSecretSet;
use crate::domain::foundation::{ProjectId, ProviderCode};
use crate::domain::webhook::{GenericCallbackMapper, ProviderWebhookConfig};

/// A merchant application that owns sessions and transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    /// Redirect after a successful payment when the caller gives none.
    pub default_success_url: Option<String>,
    /// Redirect after a failed or expired payment when the caller gives none.
    pub default_failure_url: Option<String>,
}

impl Project {
    pub fn new(id: ProjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            default_success_url: None,
            default_failure_url: None,
        }
    }

    pub fn with_redirects(
        mut self,
        success_url: Option<String>,
        failure_url: Option<String>,
    ) -> Self {
        self.default_success_url = success_url;
        self.default_failure_url = failure_url;
        self
    }
}

/// A mobile-money provider configured for one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    pub project_id: ProjectId,
    pub code: ProviderCode,
    pub name: String,
    pub active: bool,
    /// Credential fields that must be present before initiating a payment.
    pub required_secret_fields: Vec<String>,
    pub secrets: EncryptedSecretSet,
    /// Inbound callback authentication. `None` means callbacks are refused.
    pub webhook: Option<ProviderWebhookConfig>,
    #[serde(default)]
    pub callback_mapping: GenericCallbackMapper,
}

impl Provider {
    pub fn new(project_id: ProjectId, code: ProviderCode, name: impl Into<String>) -> Self {
        Self {
            project_id,
            code,
            name: name.into(),
            active: true,
            required_secret_fields: Vec::new(),
            secrets: EncryptedSecretSet::new(),
            webhook: None,
            callback_mapping: GenericCallbackMapper::default(),
        }
    }

    pub fn with_secrets(mut self, required: Vec<String>, secrets: EncryptedSecretSet) -> Self {
        self.required_secret_fields = required;
        self.secrets = secrets;
        self
    }

    pub fn with_webhook(mut self, webhook: ProviderWebhookConfig) -> Self {
        self.webhook = Some(webhook);
        self
    }

    pub fn with_callback_mapping(mut self, mapping: GenericCallbackMapper) -> Self {
        self.callback_mapping = mapping;
        self
    }

    pub fn deactivated(mut self) -> Self {
        self.active = false;
        self
    }

    /// Public view without credentials.
    pub fn summary(&self) -> ProviderSummary {
        ProviderSummary {
            code: self.code.clone(),
            name: self.name.clone(),
        }
    }
}

/// Provider as shown to payers and merchants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSummary {
    pub code: ProviderCode,
    pub name: String,
}
