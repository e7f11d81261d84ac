//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - axum REST API and webhook endpoint
//! - `initiator` - Payment initiation clients
//! - `memory` - In-memory repositories for tests and local runs
//! - `notifier` - Outbound merchant webhook delivery
//! - `postgres` - PostgreSQL repositories

pub mod http;
pub mod initiator;
pub mod memory;
pub mod notifier;
pub mod postgres;

pub use initiator::{HttpPaymentInitiator, MockPaymentInitiator};
pub use memory::{
    InMemoryPayerRepository, InMemoryProjectCatalog, InMemorySessionRepository,
    InMemoryTransactionRepository, InMemoryWebhookEndpointRepository,
};
pub use notifier::{HttpWebhookNotifier, RecordingNotifier};
