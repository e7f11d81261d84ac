//! Mapping of provider callback payloads to a canonical outcome.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::WebhookError;
use crate::domain::foundation::TransactionStatus;

/// Provider-independent result of a callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalCallback {
    pub reference: String,
    pub status: TransactionStatus,
}

/// Turns an authenticated provider payload into a [`CanonicalCallback`].
pub trait CallbackMapper: Send + Sync {
    /// # Errors
    ///
    /// - `ParseError` if the payload is not JSON or lacks the reference
    /// - `Ignored` if the provider status is not terminal
    fn map(&self, body: &[u8]) -> Result<CanonicalCallback, WebhookError>;
}

/// Reads reference and status from configurable JSON pointers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericCallbackMapper {
    pub reference_pointer: String,
    pub status_pointer: String,
}

impl Default for GenericCallbackMapper {
    fn default() -> Self {
        Self {
            reference_pointer: "/reference".to_string(),
            status_pointer: "/status".to_string(),
        }
    }
}

impl GenericCallbackMapper {
    pub fn new(reference_pointer: impl Into<String>, status_pointer: impl Into<String>) -> Self {
        Self {
            reference_pointer: reference_pointer.into(),
            status_pointer: status_pointer.into(),
        }
    }
}

impl CallbackMapper for GenericCallbackMapper {
    fn map(&self, body: &[u8]) -> Result<CanonicalCallback, WebhookError> {
        let payload: Value =
            serde_json::from_slice(body).map_err(|e| WebhookError::ParseError(e.to_string()))?;

        let reference = match payload.pointer(&self.reference_pointer) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(WebhookError::ParseError(format!(
                    "missing reference at {}",
                    self.reference_pointer
                )))
            }
        };

        let raw_status = payload
            .pointer(&self.status_pointer)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                WebhookError::ParseError(format!("missing status at {}", self.status_pointer))
            })?;

        let status = terminal_status(raw_status).ok_or_else(|| {
            WebhookError::Ignored(format!("status '{}' is not terminal", raw_status))
        })?;

        Ok(CanonicalCallback { reference, status })
    }
}

/// Provider status vocabulary. `None` for anything that is not a final outcome.
pub fn terminal_status(raw: &str) -> Option<TransactionStatus> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "succeeded" | "success" | "successful" | "completed" | "paid" => {
            Some(TransactionStatus::Succeeded)
        }
        "failed" | "cancelled" | "canceled" | "declined" | "error" => {
            Some(TransactionStatus::Failed)
        }
        "expired" | "timeout" => Some(TransactionStatus::Expired),
        _ => None,
    }
}
