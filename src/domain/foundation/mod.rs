//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the payment gateway domain.

mod errors;
mod ids;
mod session_status;
mod state_machine;
mod timestamp;
mod transaction_status;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{EndpointId, PayerId, ProjectId, ProviderCode, SessionId, TransactionId};
pub use session_status::SessionStatus;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
pub use transaction_status::TransactionStatus;
