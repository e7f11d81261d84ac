//! SessionStatus enum for tracking the lifecycle of a checkout session.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{StateMachine, ValidationError};

/// Lifecycle status of a checkout session.
///
/// `opened -> pending -> {completed | failed | expired | closed}`; an opened
/// session may also expire or be closed without ever reaching pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Opened,
    Pending,
    Completed,
    Failed,
    Expired,
    Closed,
}

impl SessionStatus {
    /// Storage / wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Opened => "opened",
            SessionStatus::Pending => "pending",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
            SessionStatus::Expired => "expired",
            SessionStatus::Closed => "closed",
        }
    }

    /// Returns true for statuses whose outcome counts as a successful payment.
    pub fn is_success(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Closed)
    }
}

impl StateMachine for SessionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SessionStatus::*;
        matches!(
            (self, target),
            (Opened, Pending)
                | (Opened, Expired)
                | (Opened, Closed)
                | (Pending, Completed)
                | (Pending, Failed)
                | (Pending, Expired)
                | (Pending, Closed)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SessionStatus::*;
        match self {
            Opened => vec![Pending, Expired, Closed],
            Pending => vec![Completed, Failed, Expired, Closed],
            Completed | Failed | Expired | Closed => vec![],
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opened" => Ok(SessionStatus::Opened),
            "pending" => Ok(SessionStatus::Pending),
            "completed" => Ok(SessionStatus::Completed),
            "failed" => Ok(SessionStatus::Failed),
            "expired" => Ok(SessionStatus::Expired),
            "closed" => Ok(SessionStatus::Closed),
            other => Err(ValidationError::invalid_format(
                "session_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}
