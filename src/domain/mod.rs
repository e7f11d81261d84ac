//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, enums, errors)
//! - `cipher` - Secret protection at rest, password hashing, secure tokens
//! - `webhook` - Inbound callback authentication and payload mapping
//! - `session` - Checkout session lifecycle
//! - `transaction` - Money movement attempts and payers
//! - `project` - Merchant projects, providers and credentials
//! - `notification` - Outbound merchant webhooks

pub mod cipher;
pub mod foundation;
pub mod notification;
pub mod project;
pub mod session;
pub mod transaction;
pub mod webhook;
