//! Layered configuration for the `kampus` binary.
//!
//! Sources, highest priority last:
//! 1. Built-in defaults
//! 2. `~/.config/kampus/config.toml`
//! 3. `./kampus.toml`
//! 4. The file passed with `--config`
//! 5. `KAMPUS_*` environment variables, `__` separating sections
//!    (`KAMPUS_CHAT__FALLBACK_NAME` -> `chat.fallback_name`)

use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use kampus_chat::ChatSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const LOCAL_CONFIG: &str = "kampus.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("config file not found: {0}")]
    MissingFile(PathBuf),

    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KampusConfig {
    /// Campus clock, hours east of UTC.
    pub utc_offset_hours: i32,
    /// Dataset JSON backing the in-memory store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_path: Option<PathBuf>,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub chat: ChatSettings,
}

impl Default for KampusConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: 7,
            data_path: None,
            log_filter: "warn".into(),
            chat: ChatSettings::default(),
        }
    }
}

impl KampusConfig {
    /// Extract and validate the merged configuration.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(explicit)?.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Build the provider chain. An explicit file must exist.
    pub fn figment(explicit: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global) = Self::global_config_path().filter(|p| p.exists()) {
            figment = figment.merge(Toml::file(global));
        }
        let local = PathBuf::from(LOCAL_CONFIG);
        if local.exists() {
            figment = figment.merge(Toml::file(local));
        }
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(ConfigError::MissingFile(path.to_path_buf()));
            }
            figment = figment.merge(Toml::file(path));
        }

        Ok(figment.merge(Env::prefixed("KAMPUS_").split("__")))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err(ConfigError::InvalidValue {
                field: "utc_offset_hours".into(),
                reason: format!("{} is outside -12..=14", self.utc_offset_hours),
            });
        }
        if self.chat.fallback_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "chat.fallback_name".into(),
                reason: "must not be blank".into(),
            });
        }
        Ok(())
    }

    pub fn utc_offset(&self) -> Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            ConfigError::InvalidValue {
                field: "utc_offset_hours".into(),
                reason: format!("{} is not a valid offset", self.utc_offset_hours),
            }
        })
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("kampus").join("config.toml"))
    }
}
