//! TransactionStatus enum: a transaction leaves PENDING at most once.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{SessionStatus, StateMachine, ValidationError};

/// Status of a money-movement attempt with a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Succeeded,
    Failed,
    Expired,
}

impl TransactionStatus {
    /// Storage / wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Succeeded => "SUCCEEDED",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::Expired => "EXPIRED",
        }
    }

    /// Session status a linked session is cascaded to once this status is reached.
    ///
    /// Returns `None` for `Pending`.
    pub fn session_outcome(&self) -> Option<SessionStatus> {
        match self {
            TransactionStatus::Pending => None,
            TransactionStatus::Succeeded => Some(SessionStatus::Closed),
            TransactionStatus::Failed => Some(SessionStatus::Failed),
            TransactionStatus::Expired => Some(SessionStatus::Expired),
        }
    }

    /// Outbound event type emitted once this status is reached.
    pub fn event_type(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "transaction.pending",
            TransactionStatus::Succeeded => "transaction.succeeded",
            TransactionStatus::Failed => "transaction.failed",
            TransactionStatus::Expired => "transaction.expired",
        }
    }
}

impl StateMachine for TransactionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        matches!(self, TransactionStatus::Pending) && !matches!(target, TransactionStatus::Pending)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match self {
            TransactionStatus::Pending => vec![
                TransactionStatus::Succeeded,
                TransactionStatus::Failed,
                TransactionStatus::Expired,
            ],
            _ => vec![],
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TransactionStatus::Pending),
            "SUCCEEDED" => Ok(TransactionStatus::Succeeded),
            "FAILED" => Ok(TransactionStatus::Failed),
            "EXPIRED" => Ok(TransactionStatus::Expired),
            other => Err(ValidationError::invalid_format(
                "transaction_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}
