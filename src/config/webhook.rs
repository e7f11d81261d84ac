//! Outbound and upstream HTTP timeouts

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Per-request timeout for merchant notifications
    #[serde(default = "default_outbound_timeout")]
    pub outbound_timeout_secs: u64,

    /// Upper bound on a provider initiation call
    #[serde(default = "default_initiation_timeout")]
    pub initiation_timeout_secs: u64,
}

impl WebhookConfig {
    pub fn outbound_timeout(&self) -> Duration {
        Duration::from_secs(self.outbound_timeout_secs)
    }

    pub fn initiation_timeout(&self) -> Duration {
        Duration::from_secs(self.initiation_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.outbound_timeout_secs == 0 || self.outbound_timeout_secs > 120 {
            return Err(ValidationError::InvalidOutboundTimeout);
        }
        if self.initiation_timeout_secs == 0 || self.initiation_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            outbound_timeout_secs: default_outbound_timeout(),
            initiation_timeout_secs: default_initiation_timeout(),
        }
    }
}

fn default_outbound_timeout() -> u64 {
    10
}

fn default_initiation_timeout() -> u64 {
    15
}
