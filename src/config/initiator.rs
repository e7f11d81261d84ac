//! Payment initiation connectors

use std::collections::HashMap;

use serde::Deserialize;

use super::error::ValidationError;
use super::session::check_url;

/// Which payment initiator the server wires in
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InitiatorMode {
    /// POST to the connector configured per provider
    #[default]
    Http,
    /// Deterministic fake links, for local development only
    Mock,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct InitiatorConfig {
    #[serde(default)]
    pub mode: InitiatorMode,

    /// Connector URL per provider code,
    /// e.g. `PAYGATE__INITIATOR__ENDPOINTS__WAVE=http://wave-connector/initiate`
    #[serde(default)]
    pub endpoints: HashMap<String, String>,
}

impl InitiatorConfig {
    pub fn validate(&self, is_production: bool) -> Result<(), ValidationError> {
        if is_production && self.mode == InitiatorMode::Mock {
            return Err(ValidationError::MockInitiatorInProduction);
        }
        if is_production && self.mode == InitiatorMode::Http && self.endpoints.is_empty() {
            return Err(ValidationError::MissingRequired("initiator.endpoints"));
        }
        for url in self.endpoints.values() {
            check_url("initiator.endpoints", url)?;
        }
        Ok(())
    }
}
