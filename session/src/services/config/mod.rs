//! Session and network configuration.
//!
//! All values are defaults rather than business rules; hosts can override any
//! of them with a camelCase JSON document (see [`AppConfig::from_json`]).

use std::sync::OnceLock;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::services::client::ClientError;
use crate::utils::{join_url, page_origin};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    pub session: SessionConfig,
    pub retry: RetryConfig,
    /// Base URL for same-origin calls. Defaults to the page origin.
    pub api_base_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    /// Master switch for the session monitor
    pub enabled: bool,
    pub tick_interval_ms: u64,
    pub refresh_threshold_minutes: f64,
    pub default_session_duration_ms: u64,
    /// Identity sent when no username has been stored yet
    pub guest_username: String,
    pub auth_endpoint: String,
    /// Response header carrying the session duration hint, in milliseconds
    pub session_duration_header: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub max_backoff_ms: u64,
    pub retryable_statuses: Vec<u16>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_interval_ms: 60_000,       // 1 minute
            refresh_threshold_minutes: 5.0, // refresh in the last 5 minutes
            default_session_duration_ms: 60 * 60 * 1000, // 1 hour
            guest_username: "guest".to_string(),
            auth_endpoint: "/api/auth/guest-login".to_string(),
            session_duration_header: "x-session-duration".to_string(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 500,
            max_backoff_ms: 10_000,
            retryable_statuses: vec![408, 425, 429, 500, 502, 503, 504],
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            retry: RetryConfig::default(),
            api_base_url: None,
        }
    }
}

fn invalid(field: &str, message: &str) -> ClientError {
    ClientError::Configuration {
        field: field.to_string(),
        message: message.to_string(),
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.tick_interval_ms == 0 {
            return Err(invalid("tickIntervalMs", "must be greater than 0"));
        }

        if !self.refresh_threshold_minutes.is_finite() || self.refresh_threshold_minutes <= 0.0 {
            return Err(invalid(
                "refreshThresholdMinutes",
                "must be a positive number",
            ));
        }

        if self.default_session_duration_ms == 0 {
            return Err(invalid("defaultSessionDurationMs", "must be greater than 0"));
        }

        if self.guest_username.trim().is_empty() {
            return Err(invalid("guestUsername", "must not be empty"));
        }

        if self.auth_endpoint.trim().is_empty() {
            return Err(invalid("authEndpoint", "must not be empty"));
        }

        Ok(())
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.max_attempts == 0 {
            return Err(invalid("maxAttempts", "must be at least 1"));
        }

        if self.max_backoff_ms < self.backoff_base_ms {
            return Err(invalid("maxBackoffMs", "must not be below backoffBaseMs"));
        }

        Ok(())
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ClientError> {
        self.session.validate()?;
        self.retry.validate()
    }

    /// Parse and validate a JSON override document. Missing keys keep their
    /// defaults.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: AppConfig =
            serde_json::from_str(json).context("Failed to parse session configuration")?;
        config
            .validate()
            .context("Session configuration failed validation")?;
        Ok(config)
    }

    /// Base URL for same-origin requests, if one is known.
    pub fn base_url(&self) -> Option<String> {
        self.api_base_url.clone().or_else(page_origin)
    }

    /// Resolve a same-origin path against [`AppConfig::base_url`]. Paths are
    /// returned unchanged when no base is known.
    pub fn resolve(&self, path: &str) -> String {
        match self.base_url() {
            Some(base) => join_url(&base, path),
            None => path.to_string(),
        }
    }
}

static GLOBAL_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Get the global configuration, initialized with validated defaults
pub fn get_global_config() -> AppConfig {
    GLOBAL_CONFIG.get_or_init(AppConfig::default).clone()
}

/// Install a host-supplied configuration. Must run before the first
/// `get_global_config()`; returns `false` if a configuration was already in
/// place or the new one is invalid.
pub fn init_global_config(config: AppConfig) -> bool {
    if let Err(e) = config.validate() {
        tracing::warn!("Invalid configuration, keeping defaults: {}", e);
        return false;
    }
    GLOBAL_CONFIG.set(config).is_ok()
}

/// Install host-supplied JSON overrides as the global configuration.
///
/// Unparseable or invalid documents are logged and leave the defaults in
/// place.
pub fn load_global_config(json: &str) -> bool {
    match AppConfig::from_json(json) {
        Ok(config) => init_global_config(config),
        Err(e) => {
            tracing::warn!("Ignoring host session configuration: {:#}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.session.tick_interval_ms, 60_000);
        assert_eq!(config.session.refresh_threshold_minutes, 5.0);
        assert_eq!(config.session.default_session_duration_ms, 3_600_000);
        assert!(config.retry.max_attempts >= 1);
    }

    #[test]
    fn json_overrides_merge_with_defaults() {
        let config = AppConfig::from_json(
            r#"{
                "session": { "tickIntervalMs": 30000, "guestUsername": "visitor" },
                "retry": { "maxAttempts": 5 },
                "apiBaseUrl": "https://travel.test"
            }"#,
        )
        .unwrap();

        assert_eq!(config.session.tick_interval_ms, 30_000);
        assert_eq!(config.session.guest_username, "visitor");
        assert_eq!(config.session.refresh_threshold_minutes, 5.0);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.backoff_base_ms, 500);
        assert_eq!(
            config.resolve("/api/auth/guest-login"),
            "https://travel.test/api/auth/guest-login"
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = AppConfig::from_json(r#"{ "retry": { "maxAttempts": 0 } }"#).unwrap_err();
        assert!(format!("{:#}", err).contains("maxAttempts"));

        let mut config = AppConfig::default();
        config.session.refresh_threshold_minutes = -1.0;
        assert!(matches!(
            config.validate(),
            Err(ClientError::Configuration { field, .. }) if field == "refreshThresholdMinutes"
        ));

        assert!(AppConfig::from_json("not json").is_err());
    }

    #[test]
    fn resolve_without_base_keeps_path() {
        let config = AppConfig::default();
        assert_eq!(config.resolve("/api/x"), "/api/x");
    }

    // the only test that touches the process-wide configuration
    #[test]
    fn host_configuration_is_installed_once() {
        assert!(!load_global_config("{ not json"));
        assert!(!load_global_config(r#"{ "retry": { "maxAttempts": 0 } }"#));

        assert!(load_global_config(
            r#"{ "session": { "guestUsername": "visitor" } }"#
        ));
        assert_eq!(get_global_config().session.guest_username, "visitor");

        assert!(!load_global_config(r#"{ "session": { "guestUsername": "other" } }"#));
        assert_eq!(get_global_config().session.guest_username, "visitor");
    }
}
