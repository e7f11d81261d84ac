//! Application layer - Services orchestrating the domain through ports.
//!
//! Commands and queries are plain structs; each service method loads
//! aggregates, applies domain behavior and persists through the ports.

mod session_lifecycle;
mod webhook_processing;

pub use session_lifecycle::{
    CheckoutCommand, CheckoutResult, GetSessionQuery, InitiateSessionCommand,
    InitiateSessionResult, PayerDetails, SessionLifecycleService, SessionSettings, SessionView,
    WaitStatusResult,
};
pub use webhook_processing::{
    DispatchMode, OutboundDispatcher, WebhookOutcome, WebhookProcessingService,
};
