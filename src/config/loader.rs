//! Configuration Loader
//!
//! Layers, lowest precedence first: the YAML file (if any), then environment
//! variables under a prefix with `__` as the nesting separator, so
//! `RELAY__DATABASE__URL` overrides `database.url`.

use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::error::{ConfigResult, ConfigurationError};
use super::RelayConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/relay.yaml";
pub const CONFIG_PATH_ENV: &str = "RELAY_CONFIG";
pub const ENV_PREFIX: &str = "RELAY";

#[derive(Debug, Clone)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    /// An explicit file must exist; the default location may be absent
    file_required: bool,
    env_prefix: Option<String>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// File from `RELAY_CONFIG` (required) or `config/relay.yaml` (optional),
    /// overridden by `RELAY__*` variables
    pub fn new() -> Self {
        match env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.trim().is_empty() => Self {
                file: Some(PathBuf::from(path)),
                file_required: true,
                env_prefix: Some(ENV_PREFIX.to_string()),
            },
            _ => Self {
                file: Some(PathBuf::from(DEFAULT_CONFIG_PATH)),
                file_required: false,
                env_prefix: Some(ENV_PREFIX.to_string()),
            },
        }
    }

    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self.file_required = true;
        self
    }

    pub fn without_file(mut self) -> Self {
        self.file = None;
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    pub fn without_env(mut self) -> Self {
        self.env_prefix = None;
        self
    }

    /// Build, deserialize and validate
    pub fn load(&self) -> ConfigResult<RelayConfig> {
        let mut builder = config::Config::builder();

        if let Some(path) = &self.file {
            if self.file_required && !path.exists() {
                return Err(ConfigurationError::ConfigFileNotFound { path: path.clone() });
            }
            debug!(path = %path.display(), required = self.file_required, "Adding configuration file");
            builder = builder.add_source(
                config::File::from(path.as_path())
                    .format(config::FileFormat::Yaml)
                    .required(self.file_required),
            );
        }

        if let Some(prefix) = &self.env_prefix {
            builder = builder.add_source(
                config::Environment::with_prefix(prefix)
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let mut config: RelayConfig = builder.build()?.try_deserialize()?;
        // Map keys may arrive lower-cased from the file or environment layers
        config.registration.country_strategies = std::mem::take(
            &mut config.registration.country_strategies,
        )
        .into_iter()
        .map(|(code, strategy)| (code.to_uppercase(), strategy))
        .collect();
        config.validate()?;

        info!(
            app_env = %config.app_env,
            countries = config.registration.country_strategies.len(),
            applicant_workers = config.applicant_bot.polling.worker_pool_size,
            reviewer_workers = config.reviewer_bot.polling.worker_pool_size,
            "🔧 Configuration loaded successfully"
        );
        Ok(config)
    }
}
