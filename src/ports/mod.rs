//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `SessionRepository` - Sessions, including the conditional status write
//! - `TransactionRepository` - Transactions with the PENDING-only guard
//! - `PayerRepository` - Payers keyed by phone number
//! - `ProjectCatalog` - Read-only project and provider lookup
//! - `WebhookEndpointRepository` - Merchant notification endpoints
//!
//! ## Outbound Ports
//!
//! - `PaymentInitiator` - Starts a charge with a provider
//! - `WebhookNotifier` - Delivers events to merchant endpoints

mod payer_repository;
mod payment_initiator;
mod project_catalog;
mod session_repository;
mod transaction_repository;
mod webhook_endpoint_repository;
mod webhook_notifier;

pub use payer_repository::PayerRepository;
pub use payment_initiator::{InitiationRequest, InitiationResponse, PaymentInitiator};
pub use project_catalog::ProjectCatalog;
pub use session_repository::SessionRepository;
pub use transaction_repository::TransactionRepository;
pub use webhook_endpoint_repository::WebhookEndpointRepository;
pub use webhook_notifier::WebhookNotifier;
