//! Webhook module - Inbound callback authentication.
//!
//! Provider webhook configuration, signature header parsing, the
//! shared-secret and HMAC validators, the validator factory, and mapping of
//! provider payloads to a canonical `{reference, status}` outcome.

mod callback;
mod config;
mod errors;
mod request;
mod signature;
mod validators;

pub use callback::{terminal_status, CallbackMapper, CanonicalCallback, GenericCallbackMapper};
pub use config::{
    AuthKind, DigestAlgorithm, DigestEncoding, PayloadStrategy, ProviderWebhookConfig,
    ValuePrefix,
};
pub use errors::WebhookError;
pub use request::WebhookRequest;
pub use signature::SignatureHeader;
pub use validators::{
    compute_signature, HmacValidator, SharedSecretValidator, ValidatorFactory, WebhookValidator,
};
