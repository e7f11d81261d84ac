//! Payment initiator adapters.
//!
//! The HTTP initiator talks to per-provider connectors. The mock stands in
//! for them in tests and local development runs.

mod http;
mod mock;

pub use http::HttpPaymentInitiator;
pub use mock::{InitiationCall, MockPaymentInitiator};
