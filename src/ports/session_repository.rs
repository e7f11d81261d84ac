//! Session repository port.
//!
//! Defines the contract for persisting and retrieving Session aggregates.
//!
//! # Design
//!
//! - **No deletes**: terminal is a status, sessions are never removed
//! - **Conditional writes**: `update` and `transition_status` only succeed
//!   while the stored status is the one the caller read, so a stale snapshot
//!   never moves a session backward

use crate::domain::foundation::{DomainError, SessionId, SessionStatus};
use crate::domain::session::Session;
use async_trait::async_trait;

/// Repository port for Session aggregate persistence.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Save a new session.
    ///
    /// # Errors
    ///
    /// - `DatabaseError` on persistence failure
    async fn save(&self, session: &Session) -> Result<(), DomainError>;

    /// Writes `session` only if the stored status is still `expected`.
    ///
    /// Returns false when another writer changed the status first; the
    /// caller must reload before deciding again.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if session doesn't exist
    /// - `DatabaseError` on persistence failure
    async fn update(&self, session: &Session, expected: SessionStatus)
        -> Result<bool, DomainError>;

    /// Find a session by its ID.
    ///
    /// Returns `None` if not found.
    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError>;

    /// Sets `to` only if the stored status is still `from`.
    ///
    /// Returns false when another writer changed the status first.
    async fn transition_status(
        &self,
        id: &SessionId,
        from: SessionStatus,
        to: SessionStatus,
    ) -> Result<bool, DomainError>;
}
