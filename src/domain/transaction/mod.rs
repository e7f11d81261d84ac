//! Transaction module - Money movement attempts and payers.

mod aggregate;
mod payer;

pub use aggregate::{NewTransaction, Resolution, Transaction};
pub use payer::Payer;
