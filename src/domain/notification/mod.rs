//! Notification module - Outbound merchant webhooks.
//!
//! Once a transaction is resolved the merchant's own endpoints are told
//! about it. Endpoints only send; they play no part in authenticating
//! inbound provider callbacks.

use serde::{Deserialize, Serialize};

use crate::domain::cipher::EncryptedBlob;
use crate::domain::foundation::{EndpointId, ProjectId};
use crate::domain::project::{Project, ProviderSummary};
use crate::domain::transaction::{Payer, Transaction};

/// A merchant URL notified about resolved transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundWebhookEndpoint {
    pub id: EndpointId,
    pub project_id: ProjectId,
    pub url: String,
    /// Header carrying the signing secret. Defaults to `X-Webhook-Secret`.
    pub header_name: Option<String>,
    pub secret: Option<EncryptedBlob>,
    pub active: bool,
}

impl OutboundWebhookEndpoint {
    pub const DEFAULT_SECRET_HEADER: &'static str = "X-Webhook-Secret";

    pub fn new(project_id: ProjectId, url: impl Into<String>) -> Self {
        Self {
            id: EndpointId::new(),
            project_id,
            url: url.into(),
            header_name: None,
            secret: None,
            active: true,
        }
    }

    pub fn with_secret(mut self, header_name: Option<String>, secret: EncryptedBlob) -> Self {
        self.header_name = header_name;
        self.secret = Some(secret);
        self
    }

    pub fn secret_header(&self) -> &str {
        self.header_name
            .as_deref()
            .unwrap_or(Self::DEFAULT_SECRET_HEADER)
    }
}

/// Project as it appears in an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
}

impl From<&Project> for ProjectSummary {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id,
            name: project.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventData {
    pub transaction: Transaction,
    pub payer: Option<Payer>,
    pub provider: ProviderSummary,
    pub project: ProjectSummary,
}

/// Canonical `{type, data}` body posted to merchant endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

impl EventEnvelope {
    /// Builds the event for a resolved transaction. Type follows its status.
    pub fn transaction_resolved(
        transaction: Transaction,
        payer: Option<Payer>,
        provider: ProviderSummary,
        project: &Project,
    ) -> Self {
        Self {
            event_type: transaction.status().event_type().to_string(),
            data: EventData {
                transaction,
                payer,
                provider,
                project: ProjectSummary::from(project),
            },
        }
    }
}
