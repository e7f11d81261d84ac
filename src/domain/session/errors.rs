//! Session-specific error types.

use crate::domain::cipher::CipherError;
use crate::domain::foundation::{
    DomainError, ErrorCode, ProjectId, ProviderCode, SessionId, ValidationError,
};

/// Session-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Session was not found (or is expired and not requested).
    NotFound(SessionId),
    /// Session deadline has passed.
    Expired(SessionId),
    /// Invalid state for operation.
    InvalidState(String),
    /// Owning project does not exist.
    ProjectNotFound(ProjectId),
    /// Project has no active provider.
    NoActiveProvider,
    /// Provider is unknown or inactive for this project.
    ProviderUnavailable(ProviderCode),
    /// Another checkout for this session is being initiated.
    CheckoutInProgress(SessionId),
    /// The provider refused or failed to start the charge.
    UpstreamInitiationFailed(String),
    /// A stored credential could not be opened.
    Cipher(CipherError),
    /// Validation failed.
    ValidationFailed { field: String, message: String },
    /// Infrastructure error.
    Infrastructure(String),
}

impl SessionError {
    pub fn not_found(id: SessionId) -> Self {
        SessionError::NotFound(id)
    }
    pub fn invalid_state(message: impl Into<String>) -> Self {
        SessionError::InvalidState(message.into())
    }
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        SessionError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }
    pub fn infrastructure(message: impl Into<String>) -> Self {
        SessionError::Infrastructure(message.into())
    }
    pub fn code(&self) -> ErrorCode {
        match self {
            SessionError::NotFound(_) => ErrorCode::SessionNotFound,
            SessionError::Expired(_) => ErrorCode::SessionExpired,
            SessionError::InvalidState(_) => ErrorCode::InvalidStateTransition,
            SessionError::ProjectNotFound(_) => ErrorCode::ProjectNotFound,
            SessionError::NoActiveProvider | SessionError::ProviderUnavailable(_) => {
                ErrorCode::ProviderNotFound
            }
            SessionError::CheckoutInProgress(_) => ErrorCode::CheckoutInProgress,
            SessionError::UpstreamInitiationFailed(_) => ErrorCode::UpstreamInitiationFailed,
            SessionError::Cipher(CipherError::Decryption(_)) => ErrorCode::DecryptionFailed,
            SessionError::Cipher(_) => ErrorCode::EncryptionFailed,
            SessionError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            SessionError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }
    pub fn message(&self) -> String {
        match self {
            SessionError::NotFound(id) => format!("Session not found: {}", id),
            SessionError::Expired(id) => format!("Session has expired: {}", id),
            SessionError::InvalidState(msg) => format!("Invalid state: {}", msg),
            SessionError::ProjectNotFound(id) => format!("Project not found: {}", id),
            SessionError::NoActiveProvider => "No payment provider is active".to_string(),
            SessionError::ProviderUnavailable(code) => {
                format!("Provider '{}' is not available", code)
            }
            SessionError::CheckoutInProgress(id) => {
                format!("A checkout is already in progress for session {}", id)
            }
            SessionError::UpstreamInitiationFailed(msg) => {
                format!("Payment provider error: {}", msg)
            }
            SessionError::Cipher(err) => err.to_string(),
            SessionError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            SessionError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for SessionError {}

impl From<CipherError> for SessionError {
    fn from(err: CipherError) -> Self {
        SessionError::Cipher(err)
    }
}

impl From<ValidationError> for SessionError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::EmptyField { ref field } | ValidationError::InvalidFormat { ref field, .. } => {
                SessionError::ValidationFailed {
                    field: field.clone(),
                    message: err.to_string(),
                }
            }
        }
    }
}

impl From<DomainError> for SessionError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::InvalidStateTransition => SessionError::InvalidState(err.message),
            ErrorCode::ValidationFailed => SessionError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.message,
            },
            ErrorCode::DecryptionFailed => {
                SessionError::Cipher(CipherError::Decryption(err.message))
            }
            ErrorCode::EncryptionFailed => {
                SessionError::Cipher(CipherError::Encryption(err.message))
            }
            ErrorCode::UpstreamInitiationFailed => {
                SessionError::UpstreamInitiationFailed(err.message)
            }
            _ => SessionError::Infrastructure(err.to_string()),
        }
    }
}
