//! HTTP routes for session endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{checkout, create_session, get_session, wait_status, SessionHandlers};

/// Creates the session router.
///
/// # Routes
///
/// - `POST /` - Open a session
/// - `GET /:id` - Fetch a session (`?include_expired=true` to see expired ones)
/// - `POST /:id/checkout` - Start a charge with a provider
/// - `GET /:id/wait` - Wait for the charge to resolve
pub fn session_routes(handlers: SessionHandlers) -> Router {
    Router::new()
        .route("/", post(create_session))
        .route("/:id", get(get_session))
        .route("/:id/checkout", post(checkout))
        .route("/:id/wait", get(wait_status))
        .with_state(handlers)
}
