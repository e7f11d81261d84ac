//! In-memory adapters.
//!
//! Implement every storage port with maps behind `tokio::sync::RwLock`.
//! Used by tests and local development.

mod endpoint_repository;
mod payer_repository;
mod project_catalog;
mod session_repository;
mod transaction_repository;

pub use endpoint_repository::InMemoryWebhookEndpointRepository;
pub use payer_repository::InMemoryPayerRepository;
pub use project_catalog::InMemoryProjectCatalog;
pub use session_repository::InMemorySessionRepository;
pub use transaction_repository::InMemoryTransactionRepository;
