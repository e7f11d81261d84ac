//! Session module - Checkout session lifecycle.
//!
//! `opened -> pending -> {completed | failed | expired | closed}`

mod aggregate;
mod errors;
mod payment;

pub use aggregate::{NewSession, Session};
pub use errors::SessionError;
pub use payment::{PaymentResult, RedirectUrls, ResolvedRedirects};
