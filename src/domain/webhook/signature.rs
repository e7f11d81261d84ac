//! Structured signature header parsing.

use super::errors::WebhookError;

/// Parsed components of a `t=<unix>,v1=<sig>[,v1=<sig>...]` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp when the signature was generated.
    pub timestamp: i64,
    /// Every `v1` value, in header order. More than one during secret rotation.
    pub candidates: Vec<String>,
}

impl SignatureHeader {
    /// Parses a signature header string.
    ///
    /// Unknown keys are ignored for forward compatibility. Signature values
    /// are kept as text; their encoding is a per-provider setting.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::ParseError` if a pair has no `=`, the timestamp
    /// is missing or not an integer, or no `v1` candidate is present.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp: Option<i64> = None;
        let mut candidates = Vec::new();

        for part in header.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| WebhookError::ParseError("invalid header format".to_string()))?;

            match key.trim() {
                "t" => {
                    timestamp = Some(value.trim().parse().map_err(|_| {
                        WebhookError::ParseError("invalid timestamp".to_string())
                    })?);
                }
                "v1" => {
                    let value = value.trim();
                    if !value.is_empty() {
                        candidates.push(value.to_string());
                    }
                }
                _ => {}
            }
        }

        let timestamp =
            timestamp.ok_or_else(|| WebhookError::ParseError("missing timestamp".to_string()))?;
        if candidates.is_empty() {
            return Err(WebhookError::ParseError("missing v1 signature".to_string()));
        }

        Ok(SignatureHeader {
            timestamp,
            candidates,
        })
    }
}
