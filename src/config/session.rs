//! Session lifecycle configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Lifetime of a new session in minutes
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: i64,

    /// Hosted checkout page; the session id is appended
    #[serde(default = "default_checkout_base_url")]
    pub checkout_base_url: String,

    /// Used when neither the session nor its project names a success page
    #[serde(default = "default_success_url")]
    pub default_success_url: String,

    #[serde(default = "default_failure_url")]
    pub default_failure_url: String,

    #[serde(default = "default_wait_poll_interval_ms")]
    pub wait_poll_interval_ms: u64,

    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
}

impl SessionConfig {
    pub fn wait_poll_interval(&self) -> Duration {
        Duration::from_millis(self.wait_poll_interval_ms)
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=1440).contains(&self.ttl_minutes) {
            return Err(ValidationError::InvalidSessionTtl);
        }
        if self.wait_poll_interval_ms == 0 || self.wait_poll_interval() >= self.wait_timeout() {
            return Err(ValidationError::InvalidWaitTiming);
        }
        check_url("session.checkout_base_url", &self.checkout_base_url)?;
        check_url("session.default_success_url", &self.default_success_url)?;
        check_url("session.default_failure_url", &self.default_failure_url)?;
        Ok(())
    }
}

pub(super) fn check_url(field: &'static str, value: &str) -> Result<(), ValidationError> {
    match reqwest::Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(()),
        _ => Err(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        }),
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: default_ttl_minutes(),
            checkout_base_url: default_checkout_base_url(),
            default_success_url: default_success_url(),
            default_failure_url: default_failure_url(),
            wait_poll_interval_ms: default_wait_poll_interval_ms(),
            wait_timeout_secs: default_wait_timeout_secs(),
        }
    }
}

fn default_ttl_minutes() -> i64 {
    60
}

fn default_checkout_base_url() -> String {
    "http://localhost:8080/checkout".to_string()
}

fn default_success_url() -> String {
    "http://localhost:8080/payment/success".to_string()
}

fn default_failure_url() -> String {
    "http://localhost:8080/payment/failure".to_string()
}

fn default_wait_poll_interval_ms() -> u64 {
    1000
}

fn default_wait_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn ttl_must_be_positive() {
        let config = SessionConfig {
            ttl_minutes: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidSessionTtl));
    }

    #[test]
    fn poll_interval_must_fit_in_wait_timeout() {
        let config = SessionConfig {
            wait_poll_interval_ms: 40_000,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidWaitTiming));
    }

    #[test]
    fn redirect_defaults_must_be_http_urls() {
        let config = SessionConfig {
            default_failure_url: "ftp://example.com".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidUrl { field: "session.default_failure_url", .. })
        ));
    }
}
