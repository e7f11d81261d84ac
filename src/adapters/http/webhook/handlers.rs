//! HTTP handler for inbound provider callbacks.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::adapters::http::error::ApiError;
use crate::application::{WebhookOutcome, WebhookProcessingService};
use crate::domain::webhook::WebhookRequest;

#[derive(Clone)]
pub struct WebhookHandlers {
    service: Arc<WebhookProcessingService>,
}

impl WebhookHandlers {
    pub fn new(service: Arc<WebhookProcessingService>) -> Self {
        Self { service }
    }
}

/// Acknowledgement body sent back to the provider.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<WebhookOutcome> for WebhookAck {
    fn from(outcome: WebhookOutcome) -> Self {
        match outcome {
            WebhookOutcome::Processed { reference, status } => Self {
                outcome: "processed",
                reference: Some(reference),
                status: Some(status.to_string()),
                reason: None,
            },
            WebhookOutcome::AlreadyProcessed { reference, status } => Self {
                outcome: "already_processed",
                reference: Some(reference),
                status: Some(status.to_string()),
                reason: None,
            },
            WebhookOutcome::Ignored { reason } => Self {
                outcome: "ignored",
                reference: None,
                status: None,
                reason: Some(reason),
            },
        }
    }
}

/// POST /webhook/:provider_code - Provider payment callback
///
/// The raw body is kept intact because signatures are computed over it.
pub async fn handle_provider_webhook(
    State(handlers): State<WebhookHandlers>,
    Path(provider_code): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = WebhookRequest::from_parts(
        headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v))),
        body.to_vec(),
    );

    match handlers.service.handle_inbound(&provider_code, &request).await {
        Ok(outcome) => (StatusCode::OK, Json(WebhookAck::from(outcome))).into_response(),
        Err(err) => {
            tracing::warn!(provider = %provider_code, error = %err, "Webhook rejected");
            ApiError::from(err).into_response()
        }
    }
}
