//! HTTP adapters - REST API implementations.
//!
//! Sessions are served under `/sessions`, provider callbacks under
//! `/webhook`.

pub mod error;
pub mod session;
pub mod webhook;

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::application::{SessionLifecycleService, WebhookProcessingService};

pub use error::{ApiError, ErrorResponse};
pub use session::{session_routes, SessionHandlers};
pub use webhook::{webhook_routes, WebhookHandlers};

/// Builds the full API router.
pub fn api_router(
    sessions: Arc<SessionLifecycleService>,
    webhooks: Arc<WebhookProcessingService>,
) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/sessions", session_routes(SessionHandlers::new(sessions)))
        .nest("/webhook", webhook_routes(WebhookHandlers::new(webhooks)))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
