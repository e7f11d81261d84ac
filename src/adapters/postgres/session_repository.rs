//! PostgreSQL implementation of SessionRepository.
//!
//! The cached payment result and the resolved redirect pair are stored as JSONB.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use super::{column, corrupt, db_error};
use crate::domain::foundation::{
    DomainError, ErrorCode, PayerId, ProjectId, SessionId, SessionStatus, Timestamp,
};
use crate::domain::session::{PaymentResult, RedirectUrls, ResolvedRedirects, Session};
use crate::ports::SessionRepository;

/// PostgreSQL implementation of SessionRepository.
#[derive(Clone)]
pub struct PostgresSessionRepository {
    pool: PgPool,
}

impl PostgresSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PostgresSessionRepository {
    async fn save(&self, session: &Session) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (
                id, project_id, payer_id, amount, currency, description, client_reference,
                status, expires_at, payment, success_url, failure_url, resolved_redirects,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(session.project_id().as_uuid())
        .bind(session.payer_id().as_uuid())
        .bind(session.amount())
        .bind(session.currency())
        .bind(session.description())
        .bind(session.client_reference())
        .bind(session.status().as_str())
        .bind(session.expires_at().as_datetime())
        .bind(session.payment().map(Json))
        .bind(session.redirects().success_url.as_deref())
        .bind(session.redirects().failure_url.as_deref())
        .bind(session.resolved_redirects().map(Json))
        .bind(session.created_at().as_datetime())
        .bind(session.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("insert session"))?;

        Ok(())
    }

    async fn update(
        &self,
        session: &Session,
        expected: SessionStatus,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE sessions SET
                status = $2,
                payment = $3,
                success_url = $4,
                failure_url = $5,
                resolved_redirects = $6,
                updated_at = $7
            WHERE id = $1 AND status = $8
            "#,
        )
        .bind(session.id().as_uuid())
        .bind(session.status().as_str())
        .bind(session.payment().map(Json))
        .bind(session.redirects().success_url.as_deref())
        .bind(session.redirects().failure_url.as_deref())
        .bind(session.resolved_redirects().map(Json))
        .bind(session.updated_at().as_datetime())
        .bind(expected.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_error("update session"))?;

        if result.rows_affected() == 1 {
            return Ok(true);
        }

        // Zero rows means either a status change or a missing row.
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM sessions WHERE id = $1)")
                .bind(session.id().as_uuid())
                .fetch_one(&self.pool)
                .await
                .map_err(db_error("check session"))?;
        if !exists {
            return Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", session.id()),
            ));
        }
        Ok(false)
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, project_id, payer_id, amount, currency, description, client_reference,
                   status, expires_at, payment, success_url, failure_url, resolved_redirects,
                   created_at, updated_at
            FROM sessions
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("fetch session"))?;

        row.map(row_to_session).transpose()
    }

    async fn transition_status(
        &self,
        id: &SessionId,
        from: SessionStatus,
        to: SessionStatus,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE sessions SET status = $3, updated_at = NOW() WHERE id = $1 AND status = $2",
        )
        .bind(id.as_uuid())
        .bind(from.as_str())
        .bind(to.as_str())
        .execute(&self.pool)
        .await
        .map_err(db_error("transition session status"))?;

        Ok(result.rows_affected() == 1)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Helper functions
// ════════════════════════════════════════════════════════════════════════════

fn row_to_session(row: sqlx::postgres::PgRow) -> Result<Session, DomainError> {
    let status: String = column(&row, "status")?;
    let status: SessionStatus = status.parse().map_err(|e| corrupt("session status", e))?;
    let payment: Option<Json<PaymentResult>> = column(&row, "payment")?;
    let resolved: Option<Json<ResolvedRedirects>> = column(&row, "resolved_redirects")?;
    let created_at: chrono::DateTime<chrono::Utc> = column(&row, "created_at")?;
    let updated_at: chrono::DateTime<chrono::Utc> = column(&row, "updated_at")?;
    let expires_at: chrono::DateTime<chrono::Utc> = column(&row, "expires_at")?;

    Ok(Session::reconstitute(
        SessionId::from_uuid(column(&row, "id")?),
        ProjectId::from_uuid(column(&row, "project_id")?),
        PayerId::from_uuid(column(&row, "payer_id")?),
        column(&row, "amount")?,
        column(&row, "currency")?,
        column(&row, "description")?,
        column(&row, "client_reference")?,
        status,
        Timestamp::from_datetime(expires_at),
        payment.map(|Json(payment)| payment),
        RedirectUrls {
            success_url: column(&row, "success_url")?,
            failure_url: column(&row, "failure_url")?,
        },
        resolved.map(|Json(resolved)| resolved),
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
    ))
}
