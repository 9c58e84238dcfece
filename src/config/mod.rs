//! # Relay Configuration
//!
//! Typed configuration for both bots, the relay channels, storage and the
//! registration workflow. Loaded by [`ConfigLoader`] from an optional YAML
//! file layered under `RELAY__*` environment variables, then validated.
//! Invalid configuration is fatal at startup.

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::events::EventBusConfig;
use crate::transport::telegram::DEFAULT_API_BASE_URL;
use crate::transport::TelegramClientConfig;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_app_env")]
    pub app_env: String,
    /// Hex-encoded AES key: 32 hex chars for AES-128, 64 for AES-256
    pub encryption_key: String,
    pub database: DatabaseConfig,
    pub applicant_bot: BotConnectionConfig,
    pub reviewer_bot: BotConnectionConfig,
    pub relay: RelayChannelConfig,
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub event_bus: EventBusSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConnectionConfig {
    pub token: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub polling: PollingConfig,
}

impl BotConnectionConfig {
    pub fn client_config(&self) -> TelegramClientConfig {
        TelegramClientConfig {
            api_base_url: self.api_base_url.clone(),
            poll_timeout_seconds: self.polling.poll_timeout_seconds,
            ..TelegramClientConfig::new(self.token.clone())
        }
    }
}

/// Ingestion loop and worker pool sizing for one actor pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,
    /// Bounded job queue between the ingestion loop and the workers
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_poll_timeout_seconds")]
    pub poll_timeout_seconds: u64,
    /// Route every update of one actor to the same worker
    #[serde(default = "default_true")]
    pub serialize_per_actor: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            worker_pool_size: default_worker_pool_size(),
            queue_capacity: default_queue_capacity(),
            poll_timeout_seconds: default_poll_timeout_seconds(),
            serialize_per_actor: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayChannelConfig {
    /// Relay channel used as the verification queue
    pub channel_id: i64,
    /// Channel where reviewers receive artifacts with decision buttons
    pub review_channel_id: i64,
    /// Transport handles seeded as reviewer actors at startup
    #[serde(default)]
    pub reviewer_handles: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryStrategy {
    /// Button label shown to applicants
    pub title: String,
    pub strategy: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    #[serde(default = "default_policy_url")]
    pub policy_url: String,
    /// ISO country code to strategy; iteration order is ISO order
    pub country_strategies: BTreeMap<String, CountryStrategy>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBusSettings {
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
    #[serde(default = "default_true")]
    pub log_subscriber_errors: bool,
}

impl Default for EventBusSettings {
    fn default() -> Self {
        Self {
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
            log_subscriber_errors: true,
        }
    }
}

impl EventBusSettings {
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    pub fn bus_config(&self) -> EventBusConfig {
        EventBusConfig {
            log_subscriber_errors: self.log_subscriber_errors,
            shutdown_timeout: self.shutdown_timeout(),
        }
    }
}

fn default_app_env() -> String {
    "development".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_worker_pool_size() -> usize {
    5
}

fn default_queue_capacity() -> usize {
    100
}

fn default_poll_timeout_seconds() -> u64 {
    30
}

fn default_shutdown_timeout_ms() -> u64 {
    5000
}

fn default_policy_url() -> String {
    "https://example.com/terms".to_string()
}

fn default_true() -> bool {
    true
}

impl RelayConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "database.url",
                "database configuration",
            ));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                "0",
                "pool size must be greater than 0",
            ));
        }

        let key_len = self.encryption_key.trim().len();
        if key_len != 32 && key_len != 64 {
            return Err(ConfigurationError::invalid_value(
                "encryption_key",
                format!("<{key_len} chars>"),
                "key must be 32 or 64 hex characters",
            ));
        }
        if hex::decode(self.encryption_key.trim()).is_err() {
            return Err(ConfigurationError::invalid_value(
                "encryption_key",
                "<redacted>",
                "key must be hex encoded",
            ));
        }

        for (name, bot) in [
            ("applicant_bot", &self.applicant_bot),
            ("reviewer_bot", &self.reviewer_bot),
        ] {
            if bot.token.trim().is_empty() {
                return Err(ConfigurationError::missing_required_field(
                    format!("{name}.token"),
                    "bot configuration",
                ));
            }
            if bot.polling.worker_pool_size == 0 {
                return Err(ConfigurationError::invalid_value(
                    format!("{name}.polling.worker_pool_size"),
                    "0",
                    "worker pool size must be greater than 0",
                ));
            }
            if bot.polling.queue_capacity == 0 {
                return Err(ConfigurationError::invalid_value(
                    format!("{name}.polling.queue_capacity"),
                    "0",
                    "queue capacity must be greater than 0",
                ));
            }
        }

        if self.relay.channel_id == 0 {
            return Err(ConfigurationError::invalid_value(
                "relay.channel_id",
                "0",
                "channel id must be set",
            ));
        }
        if self.relay.review_channel_id == 0 {
            return Err(ConfigurationError::invalid_value(
                "relay.review_channel_id",
                "0",
                "channel id must be set",
            ));
        }

        if self.registration.country_strategies.is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "registration.country_strategies",
                "registration configuration",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_config() -> RelayConfig {
        let mut countries = BTreeMap::new();
        countries.insert(
            "DE".to_string(),
            CountryStrategy {
                title: "Germany".to_string(),
                strategy: "sepa".to_string(),
            },
        );
        let bot = |token: &str| BotConnectionConfig {
            token: token.to_string(),
            api_base_url: default_api_base_url(),
            polling: PollingConfig::default(),
        };

        RelayConfig {
            app_env: "test".to_string(),
            encryption_key: "00".repeat(32),
            database: DatabaseConfig {
                url: "postgresql://localhost/relay_test".to_string(),
                max_connections: 5,
            },
            applicant_bot: bot("applicant-token"),
            reviewer_bot: bot("reviewer-token"),
            relay: RelayChannelConfig {
                channel_id: -1001,
                review_channel_id: -1002,
                reviewer_handles: vec![900],
            },
            registration: RegistrationConfig {
                policy_url: default_policy_url(),
                country_strategies: countries,
            },
            event_bus: EventBusSettings::default(),
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(sample_config().validate().is_ok());
    }

    #[test]
    fn test_validation_rules() {
        let mut config = sample_config();
        config.encryption_key = "abc".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::InvalidValue { ref field, .. }) if field == "encryption_key"
        ));

        let mut config = sample_config();
        config.reviewer_bot.polling.worker_pool_size = 0;
        assert!(config.validate().is_err());

        let mut config = sample_config();
        config.registration.country_strategies.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigurationError::MissingRequiredField { .. })
        ));

        let mut config = sample_config();
        config.relay.channel_id = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_polling_defaults() {
        let polling = PollingConfig::default();
        assert_eq!(polling.worker_pool_size, 5);
        assert_eq!(polling.queue_capacity, 100);
        assert!(polling.serialize_per_actor);
    }
}
