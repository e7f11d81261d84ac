//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid listen address: {0}")]
    InvalidAddress(String),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Encryption key is configured but blank")]
    BlankEncryptionKey,

    #[error("An encryption key is required in production")]
    EncryptionKeyRequired,

    #[error("Invalid URL for {field}: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("Session TTL must be between 1 and 1440 minutes")]
    InvalidSessionTtl,

    #[error("Invalid wait timing: poll interval must be positive and below the wait timeout")]
    InvalidWaitTiming,

    #[error("Invalid outbound timeout")]
    InvalidOutboundTimeout,

    #[error("The mock payment initiator cannot run in production")]
    MockInitiatorInProduction,
}
