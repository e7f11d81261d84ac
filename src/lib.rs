//! Paygate - self-hosted mobile-money payment gateway
//!
//! Opens checkout sessions, starts charges with mobile-money providers,
//! authenticates their signed callbacks and notifies merchant endpoints
//! once a transaction resolves. Provider credentials are kept encrypted at
//! rest and opened only for the duration of a call.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
