//! Webhook signature validators and the factory that selects them.
//!
//! A validator answers one question: did this request come from the
//! provider? A missing or wrong signature is `false`, never an error. Only
//! infrastructure failures (the stored secret cannot be opened) surface as
//! `Err` from `try_validate`; `validate` folds those into `false` as well.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Sha256, Sha512};
use subtle::ConstantTimeEq;

use super::config::{AuthKind, DigestAlgorithm, DigestEncoding, ProviderWebhookConfig};
use super::errors::WebhookError;
use super::request::WebhookRequest;
use super::signature::SignatureHeader;
use crate::domain::cipher::{CipherError, CipherService};

/// Compares header value against `prefix + secret`.
#[derive(Debug, Clone)]
pub struct SharedSecretValidator {
    cipher: Arc<CipherService>,
}

impl SharedSecretValidator {
    pub fn new(cipher: Arc<CipherService>) -> Self {
        Self { cipher }
    }

    pub fn try_validate(
        &self,
        request: &WebhookRequest,
        config: &ProviderWebhookConfig,
    ) -> Result<bool, WebhookError> {
        let Some(observed) = request.header(&config.header_name) else {
            tracing::debug!(header = %config.header_name, "shared secret header missing");
            return Ok(false);
        };

        let secret = self.cipher.decrypt(&config.secret)?;
        let expected = SecretString::new(format!(
            "{}{}",
            config.value_prefix.as_header_prefix(),
            secret.expose_secret()
        ));

        Ok(constant_time_eq(
            observed.as_bytes(),
            expected.expose_secret().as_bytes(),
        ))
    }
}

/// Verifies `t=..,v1=..` signatures over the raw body.
#[derive(Debug, Clone)]
pub struct HmacValidator {
    cipher: Arc<CipherService>,
}

impl HmacValidator {
    pub fn new(cipher: Arc<CipherService>) -> Self {
        Self { cipher }
    }

    pub fn try_validate(
        &self,
        request: &WebhookRequest,
        config: &ProviderWebhookConfig,
    ) -> Result<bool, WebhookError> {
        self.try_validate_at(request, config, chrono::Utc::now().timestamp())
    }

    /// Same as [`try_validate`](Self::try_validate) against a fixed clock.
    pub fn try_validate_at(
        &self,
        request: &WebhookRequest,
        config: &ProviderWebhookConfig,
        now: i64,
    ) -> Result<bool, WebhookError> {
        let Some(raw_header) = request.header(&config.header_name) else {
            tracing::debug!(header = %config.header_name, "signature header missing");
            return Ok(false);
        };

        let header = match SignatureHeader::parse(raw_header) {
            Ok(header) => header,
            Err(e) => {
                tracing::debug!(error = %e, "signature header rejected");
                return Ok(false);
            }
        };

        if let Some(tolerance) = config.tolerance_secs {
            let skew = now.saturating_sub(header.timestamp).unsigned_abs();
            if skew > tolerance {
                tracing::warn!(
                    timestamp = header.timestamp,
                    skew_secs = skew,
                    tolerance_secs = tolerance,
                    "webhook timestamp outside replay window"
                );
                return Ok(false);
            }
        }

        let secret = self.cipher.decrypt(&config.secret)?;
        let payload = config
            .payload_strategy
            .signed_payload(header.timestamp, request.body());
        let expected = compute_signature(
            config.digest_algorithm,
            config.digest_encoding,
            secret.expose_secret().as_bytes(),
            &payload,
        )?;

        // Every candidate is compared so timing does not reveal which matched.
        let mut matched = false;
        for candidate in &header.candidates {
            let candidate = match config.digest_encoding {
                DigestEncoding::Hex => candidate.to_ascii_lowercase(),
                DigestEncoding::Base64 => candidate.clone(),
            };
            matched |= constant_time_eq(candidate.as_bytes(), expected.as_bytes());
        }
        Ok(matched)
    }
}

/// Computes an encoded HMAC digest of `payload` under `secret`.
pub fn compute_signature(
    algorithm: DigestAlgorithm,
    encoding: DigestEncoding,
    secret: &[u8],
    payload: &[u8],
) -> Result<String, WebhookError> {
    let digest = match algorithm {
        DigestAlgorithm::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(secret)
                .map_err(|e| CipherError::KeyMaterial(e.to_string()))?;
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
        DigestAlgorithm::Sha512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(secret)
                .map_err(|e| CipherError::KeyMaterial(e.to_string()))?;
            mac.update(payload);
            mac.finalize().into_bytes().to_vec()
        }
    };

    Ok(match encoding {
        DigestEncoding::Hex => hex::encode(digest),
        DigestEncoding::Base64 => BASE64.encode(digest),
    })
}

/// Length mismatch returns false up front; equal lengths compare in constant time.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// A validator for one authentication kind.
#[derive(Debug, Clone)]
pub enum WebhookValidator {
    SharedSecret(SharedSecretValidator),
    Hmac(HmacValidator),
}

impl WebhookValidator {
    pub fn kind(&self) -> AuthKind {
        match self {
            WebhookValidator::SharedSecret(_) => AuthKind::SharedSecret,
            WebhookValidator::Hmac(_) => AuthKind::Hmac,
        }
    }

    /// Authenticates the request, failing closed on any error.
    pub fn validate(&self, request: &WebhookRequest, config: &ProviderWebhookConfig) -> bool {
        match self.try_validate(request, config) {
            Ok(valid) => valid,
            Err(e) => {
                tracing::warn!(auth_kind = %self.kind(), error = %e, "webhook validation error, rejecting");
                false
            }
        }
    }

    /// Authenticates the request. `Err` only for infrastructure failures.
    pub fn try_validate(
        &self,
        request: &WebhookRequest,
        config: &ProviderWebhookConfig,
    ) -> Result<bool, WebhookError> {
        match self {
            WebhookValidator::SharedSecret(v) => v.try_validate(request, config),
            WebhookValidator::Hmac(v) => v.try_validate(request, config),
        }
    }
}

/// Dispatches authentication tags to validators.
#[derive(Debug, Clone)]
pub struct ValidatorFactory {
    cipher: Arc<CipherService>,
}

impl ValidatorFactory {
    pub fn new(cipher: Arc<CipherService>) -> Self {
        Self { cipher }
    }

    /// Returns the validator for a configured tag.
    ///
    /// # Errors
    ///
    /// `UnsupportedAuthType` for anything outside `sharedSecret` / `hmac`.
    pub fn get_validator(&self, auth_type: &str) -> Result<WebhookValidator, WebhookError> {
        Ok(self.for_kind(auth_type.parse()?))
    }

    pub fn for_kind(&self, kind: AuthKind) -> WebhookValidator {
        match kind {
            AuthKind::SharedSecret => {
                WebhookValidator::SharedSecret(SharedSecretValidator::new(self.cipher.clone()))
            }
            AuthKind::Hmac => WebhookValidator::Hmac(HmacValidator::new(self.cipher.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cipher::EncryptedBlob;
    use crate::domain::webhook::config::{PayloadStrategy, ValuePrefix};

    const SECRET: &str = "whsec_wave_test_secret";
    const BODY: &str = r#"{"reference":"tx_123","status":"succeeded"}"#;

    fn cipher() -> Arc<CipherService> {
        Arc::new(
            CipherService::from_key_setting(Some(
                "00112233445566778899aabbccddeeff00112233445566778899aabbccddeeff",
            ))
            .unwrap(),
        )
    }

    fn sign(secret: &str, timestamp: i64, body: &str) -> String {
        compute_signature(
            DigestAlgorithm::Sha256,
            DigestEncoding::Hex,
            secret.as_bytes(),
            format!("{}{}", timestamp, body).as_bytes(),
        )
        .unwrap()
    }

    fn hmac_setup(tolerance: Option<u64>) -> (HmacValidator, ProviderWebhookConfig) {
        let cipher = cipher();
        let config =
            ProviderWebhookConfig::hmac("X-Signature", cipher.encrypt(SECRET).unwrap())
                .with_tolerance(tolerance);
        (HmacValidator::new(cipher), config)
    }

    fn signed_request(header: String) -> WebhookRequest {
        WebhookRequest::new(BODY).with_header("x-signature", header)
    }

    // ══════════════════════════════════════════════════════════════
    // Shared Secret
    // ══════════════════════════════════════════════════════════════

    fn shared_setup(prefix: ValuePrefix) -> (SharedSecretValidator, ProviderWebhookConfig) {
        let cipher = cipher();
        let config =
            ProviderWebhookConfig::shared_secret("Authorization", cipher.encrypt(SECRET).unwrap())
                .with_prefix(prefix);
        (SharedSecretValidator::new(cipher), config)
    }

    #[test]
    fn shared_secret_accepts_exact_value() {
        let (validator, config) = shared_setup(ValuePrefix::None);
        let request = WebhookRequest::new(BODY).with_header("authorization", SECRET);

        assert!(validator.try_validate(&request, &config).unwrap());
    }

    #[test]
    fn shared_secret_applies_bearer_prefix() {
        let (validator, config) = shared_setup(ValuePrefix::Bearer);
        let with_prefix = WebhookRequest::new(BODY)
            .with_header("Authorization", format!("Bearer {}", SECRET));
        let without_prefix = WebhookRequest::new(BODY).with_header("Authorization", SECRET);

        assert!(validator.try_validate(&with_prefix, &config).unwrap());
        assert!(!validator.try_validate(&without_prefix, &config).unwrap());
    }

    #[test]
    fn shared_secret_applies_basic_prefix() {
        let (validator, config) = shared_setup(ValuePrefix::Basic);
        let request = WebhookRequest::new(BODY)
            .with_header("Authorization", format!("Basic {}", SECRET));

        assert!(validator.try_validate(&request, &config).unwrap());
    }

    #[test]
    fn shared_secret_rejects_any_single_character_difference() {
        let (validator, config) = shared_setup(ValuePrefix::None);

        for position in 0..SECRET.len() {
            let mut altered = SECRET.as_bytes().to_vec();
            altered[position] = if altered[position] == b'x' { b'y' } else { b'x' };
            let altered = String::from_utf8(altered).unwrap();
            let request = WebhookRequest::new(BODY).with_header("Authorization", altered);

            assert!(!validator.try_validate(&request, &config).unwrap());
        }
    }

    #[test]
    fn shared_secret_rejects_different_length() {
        let (validator, config) = shared_setup(ValuePrefix::None);
        let longer = WebhookRequest::new(BODY).with_header("Authorization", format!("{}x", SECRET));
        let shorter = WebhookRequest::new(BODY).with_header("Authorization", &SECRET[1..]);

        assert!(!validator.try_validate(&longer, &config).unwrap());
        assert!(!validator.try_validate(&shorter, &config).unwrap());
    }

    #[test]
    fn shared_secret_missing_header_is_false() {
        let (validator, config) = shared_setup(ValuePrefix::None);
        let request = WebhookRequest::new(BODY);
        assert!(!validator.try_validate(&request, &config).unwrap());
    }

    // ══════════════════════════════════════════════════════════════
    // HMAC
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn hmac_accepts_signature_within_tolerance() {
        let (validator, config) = hmac_setup(Some(300));
        let t0 = 1_700_000_000;
        let request = signed_request(format!("t={},v1={}", t0, sign(SECRET, t0, BODY)));

        assert!(validator.try_validate_at(&request, &config, t0 + 299).unwrap());
        assert!(validator.try_validate_at(&request, &config, t0 + 300).unwrap());
    }

    #[test]
    fn hmac_rejects_same_signature_past_tolerance() {
        let (validator, config) = hmac_setup(Some(300));
        let t0 = 1_700_000_000;
        let request = signed_request(format!("t={},v1={}", t0, sign(SECRET, t0, BODY)));

        assert!(!validator.try_validate_at(&request, &config, t0 + 301).unwrap());
        assert!(!validator.try_validate_at(&request, &config, t0 - 301).unwrap());
    }

    #[test]
    fn hmac_without_tolerance_ignores_age() {
        let (validator, config) = hmac_setup(None);
        let t0 = 1_000;
        let request = signed_request(format!("t={},v1={}", t0, sign(SECRET, t0, BODY)));

        assert!(validator.try_validate_at(&request, &config, t0 + 1_000_000).unwrap());
    }

    #[test]
    fn hmac_rejects_signature_from_other_secret() {
        let (validator, config) = hmac_setup(Some(300));
        let t0 = 1_700_000_000;
        let request = signed_request(format!("t={},v1={}", t0, sign("other_secret", t0, BODY)));

        assert!(!validator.try_validate_at(&request, &config, t0).unwrap());
    }

    #[test]
    fn hmac_rejects_tampered_body() {
        let (validator, config) = hmac_setup(Some(300));
        let t0 = 1_700_000_000;
        let header = format!("t={},v1={}", t0, sign(SECRET, t0, BODY));
        let request = WebhookRequest::new(BODY.replace("succeeded", "failed"))
            .with_header("X-Signature", header);

        assert!(!validator.try_validate_at(&request, &config, t0).unwrap());
    }

    #[test]
    fn hmac_rejects_reserialized_body() {
        let (validator, config) = hmac_setup(None);
        let t0 = 1_700_000_000;
        let raw = r#"{ "status": "succeeded", "reference": "tx_123" }"#;
        let header = format!("t={},v1={}", t0, sign(SECRET, t0, raw));

        let value: serde_json::Value = serde_json::from_str(raw).unwrap();
        let reserialized = serde_json::to_vec(&value).unwrap();
        let request = WebhookRequest::new(reserialized).with_header("X-Signature", header.clone());
        let original = WebhookRequest::new(raw).with_header("X-Signature", header);

        assert!(!validator.try_validate_at(&request, &config, t0).unwrap());
        assert!(validator.try_validate_at(&original, &config, t0).unwrap());
    }

    #[test]
    fn hmac_accepts_any_rotated_candidate() {
        let (validator, config) = hmac_setup(Some(300));
        let t0 = 1_700_000_000;
        let garbage = "0".repeat(64);
        let valid = sign(SECRET, t0, BODY);

        let valid_last = signed_request(format!("t={},v1={},v1={}", t0, garbage, valid));
        let valid_first = signed_request(format!("t={},v1={},v1={}", t0, valid, garbage));

        assert!(validator.try_validate_at(&valid_last, &config, t0).unwrap());
        assert!(validator.try_validate_at(&valid_first, &config, t0).unwrap());
    }

    #[test]
    fn hmac_hex_candidate_matches_case_insensitively() {
        let (validator, config) = hmac_setup(None);
        let t0 = 1_700_000_000;
        let request = signed_request(format!(
            "t={},v1={}",
            t0,
            sign(SECRET, t0, BODY).to_ascii_uppercase()
        ));

        assert!(validator.try_validate_at(&request, &config, t0).unwrap());
    }

    #[test]
    fn hmac_missing_parts_are_false() {
        let (validator, config) = hmac_setup(None);
        let t0 = 1_700_000_000;

        let no_header = WebhookRequest::new(BODY);
        let no_timestamp = signed_request(format!("v1={}", sign(SECRET, t0, BODY)));
        let no_candidate = signed_request(format!("t={}", t0));

        assert!(!validator.try_validate_at(&no_header, &config, t0).unwrap());
        assert!(!validator.try_validate_at(&no_timestamp, &config, t0).unwrap());
        assert!(!validator.try_validate_at(&no_candidate, &config, t0).unwrap());
    }

    #[test]
    fn hmac_supports_sha512_base64_with_dot_strategy() {
        let cipher = cipher();
        let config = ProviderWebhookConfig::hmac("X-Signature", cipher.encrypt(SECRET).unwrap())
            .with_digest(DigestAlgorithm::Sha512, DigestEncoding::Base64)
            .with_payload_strategy(PayloadStrategy::TimestampDotBody);
        let validator = HmacValidator::new(cipher);
        let t0 = 1_700_000_000;
        let signature = compute_signature(
            DigestAlgorithm::Sha512,
            DigestEncoding::Base64,
            SECRET.as_bytes(),
            format!("{}.{}", t0, BODY).as_bytes(),
        )
        .unwrap();
        let request = signed_request(format!("t={},v1={}", t0, signature));

        assert!(validator.try_validate_at(&request, &config, t0).unwrap());
    }

    #[test]
    fn hmac_signs_with_current_clock() {
        let (validator, config) = hmac_setup(Some(300));
        let now = chrono::Utc::now().timestamp();
        let request = signed_request(format!("t={},v1={}", now, sign(SECRET, now, BODY)));

        assert!(validator.try_validate(&request, &config).unwrap());
    }

    // ══════════════════════════════════════════════════════════════
    // Fail Closed
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn undecryptable_secret_is_an_error_and_validate_fails_closed() {
        let cipher = cipher();
        let config = ProviderWebhookConfig::shared_secret(
            "Authorization",
            EncryptedBlob::from_stored("plaintext-leaked-into-db"),
        );
        let validator = ValidatorFactory::new(cipher).for_kind(AuthKind::SharedSecret);
        let request =
            WebhookRequest::new(BODY).with_header("Authorization", "plaintext-leaked-into-db");

        assert!(matches!(
            validator.try_validate(&request, &config),
            Err(WebhookError::Cipher(_))
        ));
        assert!(!validator.validate(&request, &config));
    }

    // ══════════════════════════════════════════════════════════════
    // Factory
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn factory_returns_validator_for_known_tags() {
        let factory = ValidatorFactory::new(cipher());

        assert_eq!(
            factory.get_validator("sharedSecret").unwrap().kind(),
            AuthKind::SharedSecret
        );
        assert_eq!(factory.get_validator("hmac").unwrap().kind(), AuthKind::Hmac);
    }

    #[test]
    fn factory_rejects_unknown_tag() {
        let factory = ValidatorFactory::new(cipher());

        for tag in ["", "none", "HMAC", "jwt"] {
            assert!(matches!(
                factory.get_validator(tag),
                Err(WebhookError::UnsupportedAuthType(_))
            ));
        }
    }
}
