//! Error responses shared by the HTTP adapters.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::domain::session::SessionError;
use crate::domain::webhook::WebhookError;

/// Error body returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("BAD_REQUEST", message)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// API error
// ════════════════════════════════════════════════════════════════════════════════

/// Converts application errors to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    Session(SessionError),
    Webhook(WebhookError),
    BadRequest(String),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::Session(err)
    }
}

impl From<WebhookError> for ApiError {
    fn from(err: WebhookError) -> Self {
        ApiError::Webhook(err)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Session(err) => match err {
                SessionError::NotFound(_) | SessionError::ProjectNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                SessionError::Expired(_) => StatusCode::GONE,
                SessionError::CheckoutInProgress(_) | SessionError::InvalidState(_) => {
                    StatusCode::CONFLICT
                }
                SessionError::NoActiveProvider
                | SessionError::ProviderUnavailable(_)
                | SessionError::ValidationFailed { .. } => StatusCode::BAD_REQUEST,
                SessionError::UpstreamInitiationFailed(_) => StatusCode::BAD_GATEWAY,
                SessionError::Cipher(_) | SessionError::Infrastructure(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ApiError::Webhook(err) => err.status_code(),
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::Session(err) => ErrorResponse::new(err.code().to_string(), err.message()),
            ApiError::Webhook(err) => {
                let code = match err {
                    WebhookError::InvalidSignature => "INVALID_SIGNATURE",
                    WebhookError::UnknownProvider(_) => "PROVIDER_NOT_FOUND",
                    WebhookError::ParseError(_) => "BAD_REQUEST",
                    WebhookError::Ignored(_) => "IGNORED",
                    WebhookError::UnsupportedAuthType(_) => "UNSUPPORTED_AUTH_TYPE",
                    WebhookError::UnsupportedPayloadStrategy(_)
                    | WebhookError::Database(_)
                    | WebhookError::Cipher(_) => "INTERNAL_ERROR",
                };
                // Internal details stay in the logs.
                let message = if err.status_code().is_server_error() {
                    "Webhook processing failed".to_string()
                } else {
                    err.to_string()
                };
                ErrorResponse::new(code, message)
            }
            ApiError::BadRequest(msg) => ErrorResponse::bad_request(msg.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = ?self, "Request failed");
        }
        (status, Json(self.body())).into_response()
    }
}
