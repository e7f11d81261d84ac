//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! Tables are created outside this crate. Expected layout:
//!
//! ```sql
//! CREATE TABLE projects (
//!     id UUID PRIMARY KEY, name TEXT NOT NULL,
//!     default_success_url TEXT, default_failure_url TEXT
//! );
//! CREATE TABLE providers (
//!     project_id UUID NOT NULL REFERENCES projects(id), code TEXT NOT NULL,
//!     name TEXT NOT NULL, active BOOLEAN NOT NULL,
//!     required_secret_fields TEXT[] NOT NULL, secrets JSONB NOT NULL,
//!     webhook JSONB, callback_mapping JSONB NOT NULL,
//!     PRIMARY KEY (project_id, code)
//! );
//! CREATE TABLE payers (
//!     id UUID PRIMARY KEY, phone TEXT NOT NULL UNIQUE,
//!     name TEXT, email TEXT, created_at TIMESTAMPTZ NOT NULL
//! );
//! CREATE TABLE sessions (
//!     id UUID PRIMARY KEY, project_id UUID NOT NULL, payer_id UUID NOT NULL,
//!     amount BIGINT NOT NULL, currency TEXT NOT NULL, description TEXT,
//!     client_reference TEXT, status TEXT NOT NULL, expires_at TIMESTAMPTZ NOT NULL,
//!     payment JSONB, success_url TEXT, failure_url TEXT, resolved_redirects JSONB,
//!     created_at TIMESTAMPTZ NOT NULL, updated_at TIMESTAMPTZ NOT NULL
//! );
//! CREATE TABLE transactions (
//!     id UUID PRIMARY KEY, reference TEXT NOT NULL UNIQUE, project_id UUID NOT NULL,
//!     provider TEXT NOT NULL, session_id UUID, payer_id UUID,
//!     amount BIGINT NOT NULL, currency TEXT NOT NULL, status TEXT NOT NULL,
//!     provider_transaction_id TEXT, client_reference TEXT,
//!     resolved_at TIMESTAMPTZ, created_at TIMESTAMPTZ NOT NULL
//! );
//! CREATE TABLE webhook_endpoints (
//!     id UUID PRIMARY KEY, project_id UUID NOT NULL, url TEXT NOT NULL,
//!     header_name TEXT, secret TEXT, active BOOLEAN NOT NULL
//! );
//! ```

mod endpoint_repository;
mod payer_repository;
mod project_catalog;
mod session_repository;
mod transaction_repository;

pub use endpoint_repository::PostgresWebhookEndpointRepository;
pub use payer_repository::PostgresPayerRepository;
pub use project_catalog::PostgresProjectCatalog;
pub use session_repository::PostgresSessionRepository;
pub use transaction_repository::PostgresTransactionRepository;

use sqlx::postgres::PgRow;
use sqlx::{Decode, Postgres, Row, Type};

use crate::domain::foundation::{DomainError, ErrorCode};

/// Maps a sqlx failure to a `DatabaseError` naming the attempted action.
fn db_error(action: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::database(format!("Failed to {}: {}", action, e))
}

/// Reads one column, naming it in the error.
fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, DomainError>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get(name).map_err(|e| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Failed to get {}: {}", name, e),
        )
    })
}

/// Wraps a stored value that no longer parses into the domain type.
fn corrupt(name: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid stored {}: {}", name, err),
    )
}
