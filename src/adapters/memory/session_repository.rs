//! In-memory session repository.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, SessionId, SessionStatus, Timestamp};
use crate::domain::session::Session;
use crate::ports::SessionRepository;

/// Sessions held in a map behind an async lock.
///
/// The write lock makes the conditional writes atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemorySessionRepository {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn save(&self, session: &Session) -> Result<(), DomainError> {
        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(session.id()) {
            return Err(DomainError::database("session already exists")
                .with_detail("session_id", session.id().to_string()));
        }
        sessions.insert(*session.id(), session.clone());
        Ok(())
    }

    async fn update(
        &self,
        session: &Session,
        expected: SessionStatus,
    ) -> Result<bool, DomainError> {
        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(session.id()) {
            Some(stored) if stored.status() != expected => Ok(false),
            Some(stored) => {
                *stored = session.clone();
                Ok(true)
            }
            None => Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", session.id()),
            )),
        }
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        Ok(self.sessions.read().await.get(id).cloned())
    }

    async fn transition_status(
        &self,
        id: &SessionId,
        from: SessionStatus,
        to: SessionStatus,
    ) -> Result<bool, DomainError> {
        let mut sessions = self.sessions.write().await;
        let Some(stored) = sessions.get_mut(id) else {
            return Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", id),
            ));
        };
        if stored.status() != from {
            return Ok(false);
        }
        stored
            .advance(to, Timestamp::now())
            .map_err(|e| DomainError::new(e.code(), e.message()))?;
        Ok(true)
    }
}
