//! Webhook error types for inbound provider callbacks.
//!
//! Defines all error conditions that can occur during webhook processing,
//! with HTTP status code mapping and retryability semantics.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::cipher::CipherError;
use crate::domain::foundation::DomainError;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Configured authentication kind is not one of the known tags.
    #[error("Unsupported auth type: {0}")]
    UnsupportedAuthType(String),

    /// Configured payload strategy name is not recognized.
    #[error("Unsupported payload strategy: {0}")]
    UnsupportedPayloadStrategy(String),

    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// No provider is registered under the requested code.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Failed to parse webhook payload or signature header.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Event was intentionally ignored (not an error condition).
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// Storage operation failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Stored secret could not be opened.
    #[error("Cipher error: {0}")]
    Cipher(#[from] CipherError),
}

impl WebhookError {
    /// Returns true if the provider should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WebhookError::Database(_))
    }

    /// Maps the error to an appropriate HTTP status code.
    ///
    /// Status codes determine provider retry behavior:
    /// - 2xx: Event acknowledged, no retry
    /// - 4xx: Client error, no retry
    /// - 5xx: Server error, will retry
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature => StatusCode::UNAUTHORIZED,

            WebhookError::UnknownProvider(_) => StatusCode::NOT_FOUND,

            WebhookError::ParseError(_) => StatusCode::BAD_REQUEST,

            // Ignored events are acknowledged as success
            WebhookError::Ignored(_) => StatusCode::OK,

            WebhookError::UnsupportedAuthType(_)
            | WebhookError::UnsupportedPayloadStrategy(_)
            | WebhookError::Database(_)
            | WebhookError::Cipher(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    // ══════════════════════════════════════════════════════════════
    // Error Display Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn invalid_signature_displays_correctly() {
        let err = WebhookError::InvalidSignature;
        assert_eq!(format!("{}", err), "Invalid signature");
    }

    #[test]
    fn unsupported_auth_type_displays_tag() {
        let err = WebhookError::UnsupportedAuthType("jwt".to_string());
        assert_eq!(format!("{}", err), "Unsupported auth type: jwt");
    }

    #[test]
    fn ignored_displays_reason() {
        let err = WebhookError::Ignored("status 'processing' is not terminal".to_string());
        assert_eq!(
            format!("{}", err),
            "Event ignored: status 'processing' is not terminal"
        );
    }

    #[test]
    fn domain_error_becomes_database_error() {
        let err: WebhookError = DomainError::new(ErrorCode::DatabaseError, "pool closed").into();
        assert!(matches!(err, WebhookError::Database(_)));
    }

    // ══════════════════════════════════════════════════════════════
    // Retryability Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn database_error_is_retryable() {
        assert!(WebhookError::Database("connection failed".to_string()).is_retryable());
    }

    #[test]
    fn invalid_signature_is_not_retryable() {
        assert!(!WebhookError::InvalidSignature.is_retryable());
    }

    #[test]
    fn ignored_is_not_retryable() {
        assert!(!WebhookError::Ignored("already processed".to_string()).is_retryable());
    }

    // ══════════════════════════════════════════════════════════════
    // Status Code Tests
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn invalid_signature_returns_unauthorized() {
        assert_eq!(
            WebhookError::InvalidSignature.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn unknown_provider_returns_not_found() {
        let err = WebhookError::UnknownProvider("acme".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn parse_error_returns_bad_request() {
        let err = WebhookError::ParseError("syntax error".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn ignored_returns_ok() {
        let err = WebhookError::Ignored("not relevant".to_string());
        assert_eq!(err.status_code(), StatusCode::OK);
    }

    #[test]
    fn cipher_error_returns_internal_error() {
        let err = WebhookError::from(CipherError::Decryption("bad tag".to_string()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn unsupported_auth_type_returns_internal_error() {
        let err = WebhookError::UnsupportedAuthType("oauth".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
