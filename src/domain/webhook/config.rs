//! Per-provider webhook authentication settings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::WebhookError;
use crate::domain::cipher::EncryptedBlob;

/// Closed set of inbound authentication schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthKind {
    #[serde(rename = "sharedSecret")]
    SharedSecret,
    #[serde(rename = "hmac")]
    Hmac,
}

impl AuthKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthKind::SharedSecret => "sharedSecret",
            AuthKind::Hmac => "hmac",
        }
    }
}

impl FromStr for AuthKind {
    type Err = WebhookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sharedSecret" => Ok(AuthKind::SharedSecret),
            "hmac" => Ok(AuthKind::Hmac),
            other => Err(WebhookError::UnsupportedAuthType(other.to_string())),
        }
    }
}

impl fmt::Display for AuthKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scheme prepended to a shared secret before comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValuePrefix {
    #[default]
    None,
    Bearer,
    Basic,
}

impl ValuePrefix {
    /// Literal text placed in front of the secret, including the space.
    pub fn as_header_prefix(&self) -> &'static str {
        match self {
            ValuePrefix::None => "",
            ValuePrefix::Bearer => "Bearer ",
            ValuePrefix::Basic => "Basic ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestAlgorithm {
    #[default]
    Sha256,
    Sha512,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestEncoding {
    #[default]
    Hex,
    Base64,
}

/// How the signed payload is assembled from timestamp and raw body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadStrategy {
    /// `t ‖ body`
    #[default]
    TimestampBody,
    /// `t "." body`
    TimestampDotBody,
    /// `body`
    Body,
}

impl PayloadStrategy {
    /// Builds the exact byte sequence that was signed.
    pub fn signed_payload(&self, timestamp: i64, body: &[u8]) -> Vec<u8> {
        let t = timestamp.to_string();
        let mut payload = Vec::with_capacity(t.len() + 1 + body.len());
        match self {
            PayloadStrategy::TimestampBody => {
                payload.extend_from_slice(t.as_bytes());
            }
            PayloadStrategy::TimestampDotBody => {
                payload.extend_from_slice(t.as_bytes());
                payload.push(b'.');
            }
            PayloadStrategy::Body => {}
        }
        payload.extend_from_slice(body);
        payload
    }
}

impl FromStr for PayloadStrategy {
    type Err = WebhookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timestamp_body" => Ok(PayloadStrategy::TimestampBody),
            "timestamp_dot_body" => Ok(PayloadStrategy::TimestampDotBody),
            "body" => Ok(PayloadStrategy::Body),
            other => Err(WebhookError::UnsupportedPayloadStrategy(other.to_string())),
        }
    }
}

/// Webhook authentication settings for one provider.
///
/// The secret is only ever held as an [`EncryptedBlob`]; validators decrypt
/// it for the duration of a single check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderWebhookConfig {
    pub auth_kind: AuthKind,
    pub header_name: String,
    #[serde(default)]
    pub value_prefix: ValuePrefix,
    pub secret: EncryptedBlob,
    #[serde(default)]
    pub digest_algorithm: DigestAlgorithm,
    #[serde(default)]
    pub digest_encoding: DigestEncoding,
    /// Replay window for HMAC timestamps. `None` disables the check.
    #[serde(default)]
    pub tolerance_secs: Option<u64>,
    #[serde(default)]
    pub payload_strategy: PayloadStrategy,
}

impl ProviderWebhookConfig {
    /// Shared-secret config reading `header_name`, no prefix.
    pub fn shared_secret(header_name: impl Into<String>, secret: EncryptedBlob) -> Self {
        Self::with_kind(AuthKind::SharedSecret, header_name, secret)
    }

    /// HMAC config with SHA-256/hex over `t ‖ body` and a 5 minute window.
    pub fn hmac(header_name: impl Into<String>, secret: EncryptedBlob) -> Self {
        Self {
            tolerance_secs: Some(300),
            ..Self::with_kind(AuthKind::Hmac, header_name, secret)
        }
    }

    fn with_kind(auth_kind: AuthKind, header_name: impl Into<String>, secret: EncryptedBlob) -> Self {
        Self {
            auth_kind,
            header_name: header_name.into(),
            value_prefix: ValuePrefix::None,
            secret,
            digest_algorithm: DigestAlgorithm::default(),
            digest_encoding: DigestEncoding::default(),
            tolerance_secs: None,
            payload_strategy: PayloadStrategy::default(),
        }
    }

    pub fn with_prefix(mut self, prefix: ValuePrefix) -> Self {
        self.value_prefix = prefix;
        self
    }

    pub fn with_digest(mut self, algorithm: DigestAlgorithm, encoding: DigestEncoding) -> Self {
        self.digest_algorithm = algorithm;
        self.digest_encoding = encoding;
        self
    }

    pub fn with_tolerance(mut self, tolerance_secs: Option<u64>) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    pub fn with_payload_strategy(mut self, strategy: PayloadStrategy) -> Self {
        self.payload_strategy = strategy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_kind_parses_known_tags() {
        assert_eq!("sharedSecret".parse::<AuthKind>().unwrap(), AuthKind::SharedSecret);
        assert_eq!("hmac".parse::<AuthKind>().unwrap(), AuthKind::Hmac);
    }

    #[test]
    fn auth_kind_rejects_unknown_tag() {
        let result = "jwt".parse::<AuthKind>();
        assert!(matches!(result, Err(WebhookError::UnsupportedAuthType(t)) if t == "jwt"));
    }

    #[test]
    fn payload_strategy_builds_signed_bytes() {
        let body = br#"{"a":1}"#;
        assert_eq!(
            PayloadStrategy::TimestampBody.signed_payload(42, body),
            b"42{\"a\":1}".to_vec()
        );
        assert_eq!(
            PayloadStrategy::TimestampDotBody.signed_payload(42, body),
            b"42.{\"a\":1}".to_vec()
        );
        assert_eq!(PayloadStrategy::Body.signed_payload(42, body), body.to_vec());
    }

    #[test]
    fn payload_strategy_rejects_unknown_name() {
        assert!(matches!(
            "reversed".parse::<PayloadStrategy>(),
            Err(WebhookError::UnsupportedPayloadStrategy(_))
        ));
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let json = r#"{"auth_kind":"hmac","header_name":"X-Signature","secret":"abc"}"#;
        let config: ProviderWebhookConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.auth_kind, AuthKind::Hmac);
        assert_eq!(config.value_prefix, ValuePrefix::None);
        assert_eq!(config.digest_algorithm, DigestAlgorithm::Sha256);
        assert_eq!(config.digest_encoding, DigestEncoding::Hex);
        assert_eq!(config.payload_strategy, PayloadStrategy::TimestampBody);
        assert_eq!(config.tolerance_secs, None);
    }

    #[test]
    fn hmac_constructor_sets_replay_window() {
        let config = ProviderWebhookConfig::hmac("X-Sig", EncryptedBlob::from_stored("x"));
        assert_eq!(config.tolerance_secs, Some(300));
    }
}
