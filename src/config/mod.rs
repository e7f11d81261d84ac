//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables with the
//! `config` and `dotenvy` crates. Variables use the `PAYGATE` prefix and
//! nested values are separated by double underscores.
//!
//! # Example
//!
//! ```no_run
//! use paygate::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! ```

mod cipher;
mod database;
mod error;
mod initiator;
mod server;
mod session;
mod webhook;

pub use cipher::CipherConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use initiator::{InitiatorConfig, InitiatorMode};
pub use server::{Environment, ServerConfig};
pub use session::SessionConfig;
pub use webhook::WebhookConfig;

use serde::Deserialize;

use crate::application::SessionSettings;

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// PostgreSQL connection
    pub database: DatabaseConfig,

    /// Secret cipher key material
    #[serde(default)]
    pub cipher: CipherConfig,

    #[serde(default)]
    pub session: SessionConfig,

    /// Outbound notification and provider call timeouts
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Provider connectors used to start charges
    #[serde(default)]
    pub initiator: InitiatorConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// 1. Loads `.env` if present (development)
    /// 2. Reads variables with the `PAYGATE` prefix
    /// 3. Uses `__` to separate nested values
    ///
    /// `PAYGATE__SERVER__PORT=8080` sets `server.port`,
    /// `PAYGATE__CIPHER__ENCRYPTION_KEY=...` sets `cipher.encryption_key`.
    ///
    /// # Errors
    ///
    /// `ConfigError` if required variables are missing or cannot be parsed.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("PAYGATE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.cipher.validate(self.is_production())?;
        self.session.validate()?;
        self.webhook.validate()?;
        self.initiator.validate(self.is_production())?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }

    /// Settings handed to the session lifecycle service.
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            ttl_minutes: self.session.ttl_minutes,
            checkout_base_url: self.session.checkout_base_url.clone(),
            default_success_url: self.session.default_success_url.clone(),
            default_failure_url: self.session.default_failure_url.clone(),
            wait_poll_interval: self.session.wait_poll_interval(),
            wait_timeout: self.session.wait_timeout(),
            initiation_timeout: self.webhook.initiation_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use std::time::Duration;

    // Env vars are process-global; serialize the tests that touch them.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "PAYGATE__DATABASE__URL",
        "PAYGATE__SERVER__PORT",
        "PAYGATE__SERVER__ENVIRONMENT",
        "PAYGATE__CIPHER__ENCRYPTION_KEY",
        "PAYGATE__SESSION__TTL_MINUTES",
        "PAYGATE__INITIATOR__MODE",
        "PAYGATE__INITIATOR__ENDPOINTS__ORANGE_MONEY",
    ];

    fn set_minimal_env() {
        env::set_var("PAYGATE__DATABASE__URL", "postgresql://test@localhost/paygate");
    }

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn loads_with_only_a_database_url() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.database.url, "postgresql://test@localhost/paygate");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.session.ttl_minutes, 60);
        assert!(config.cipher.encryption_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn nested_overrides_are_applied() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PAYGATE__SERVER__PORT", "3000");
        env::set_var("PAYGATE__SESSION__TTL_MINUTES", "15");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.session_settings().ttl_minutes, 15);
    }

    #[test]
    fn production_requires_an_encryption_key() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PAYGATE__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
        assert_eq!(config.validate(), Err(ValidationError::EncryptionKeyRequired));
    }

    #[test]
    fn production_with_key_and_connector_is_valid() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PAYGATE__SERVER__ENVIRONMENT", "production");
        env::set_var("PAYGATE__CIPHER__ENCRYPTION_KEY", "a-long-operator-passphrase");
        env::set_var(
            "PAYGATE__INITIATOR__ENDPOINTS__ORANGE_MONEY",
            "http://orange-connector:9000/initiate",
        );
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.initiator.mode, InitiatorMode::Http);
        assert_eq!(
            config.initiator.endpoints.get("orange_money").map(String::as_str),
            Some("http://orange-connector:9000/initiate")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn production_refuses_the_mock_initiator() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("PAYGATE__SERVER__ENVIRONMENT", "production");
        env::set_var("PAYGATE__CIPHER__ENCRYPTION_KEY", "a-long-operator-passphrase");
        env::set_var("PAYGATE__INITIATOR__MODE", "mock");
        let result = AppConfig::load();
        clear_env();

        assert_eq!(
            result.unwrap().validate(),
            Err(ValidationError::MockInitiatorInProduction)
        );
    }

    #[test]
    fn session_settings_carry_initiation_timeout() {
        let config = AppConfig {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            cipher: CipherConfig::default(),
            session: SessionConfig::default(),
            webhook: WebhookConfig {
                initiation_timeout_secs: 7,
                ..Default::default()
            },
            initiator: InitiatorConfig::default(),
        };
        let settings = config.session_settings();
        assert_eq!(settings.initiation_timeout, Duration::from_secs(7));
        assert_eq!(settings.wait_timeout, Duration::from_secs(30));
    }
}
