//! HTTP handlers for session endpoints.
//!
//! These handlers connect axum routes to the session lifecycle service.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use super::dto::{
    CheckoutRequest, CheckoutResponse, CreateSessionRequest, CreateSessionResponse,
    GetSessionParams, SessionResponse, WaitStatusResponse,
};
use crate::adapters::http::error::ApiError;
use crate::application::{
    CheckoutCommand, GetSessionQuery, InitiateSessionCommand, PayerDetails,
    SessionLifecycleService,
};
use crate::domain::foundation::{ProjectId, ProviderCode, SessionId};
use crate::domain::session::RedirectUrls;

// ════════════════════════════════════════════════════════════════════════════
// Handler State
// ════════════════════════════════════════════════════════════════════════════

/// Shared state for session handlers.
#[derive(Clone)]
pub struct SessionHandlers {
    service: Arc<SessionLifecycleService>,
}

impl SessionHandlers {
    pub fn new(service: Arc<SessionLifecycleService>) -> Self {
        Self { service }
    }
}

fn parse_session_id(raw: &str) -> Result<SessionId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid session ID: {}", raw)))
}

// ════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /sessions - Open a payment session
pub async fn create_session(
    State(handlers): State<SessionHandlers>,
    Json(req): Json<CreateSessionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let project_id: ProjectId = req
        .project_id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid project ID: {}", req.project_id)))?;

    let cmd = InitiateSessionCommand {
        project_id,
        amount: req.amount,
        currency: req.currency,
        description: req.description,
        client_reference: req.client_reference,
        payer: PayerDetails {
            phone: req.payer.phone,
            name: req.payer.name,
            email: req.payer.email,
        },
        success_url: req.success_url,
        failure_url: req.failure_url,
    };

    let result = handlers.service.initiate(cmd).await?;
    Ok((StatusCode::CREATED, Json(CreateSessionResponse::from(result))))
}

/// GET /sessions/:id - Fetch a session and the providers it can be paid with
pub async fn get_session(
    State(handlers): State<SessionHandlers>,
    Path(id): Path<String>,
    Query(params): Query<GetSessionParams>,
) -> Result<Json<SessionResponse>, ApiError> {
    let query = GetSessionQuery {
        session_id: parse_session_id(&id)?,
        include_expired: params.include_expired,
    };

    let view = handlers.service.get_session(query).await?;
    Ok(Json(SessionResponse::from(view)))
}

/// POST /sessions/:id/checkout - Start or resume a charge
pub async fn checkout(
    State(handlers): State<SessionHandlers>,
    Path(id): Path<String>,
    Json(req): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let provider = ProviderCode::new(req.provider)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let cmd = CheckoutCommand {
        session_id: parse_session_id(&id)?,
        provider,
        redirects: RedirectUrls::new(req.success_url, req.failure_url),
    };

    let result = handlers.service.checkout(cmd).await?;
    Ok(Json(CheckoutResponse::from(result)))
}

/// GET /sessions/:id/wait - Long-poll until the session leaves pending
pub async fn wait_status(
    State(handlers): State<SessionHandlers>,
    Path(id): Path<String>,
) -> Result<Json<WaitStatusResponse>, ApiError> {
    let result = handlers.service.wait_status(parse_session_id(&id)?).await?;
    Ok(Json(WaitStatusResponse::from(result)))
}
