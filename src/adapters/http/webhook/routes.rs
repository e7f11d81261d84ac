//! HTTP routes for provider callbacks.

use axum::{routing::post, Router};

use super::handlers::{handle_provider_webhook, WebhookHandlers};

/// Creates the webhook router.
///
/// - `POST /:provider_code` - Signed callback from a payment provider
pub fn webhook_routes(handlers: WebhookHandlers) -> Router {
    Router::new()
        .route("/:provider_code", post(handle_provider_webhook))
        .with_state(handlers)
}
