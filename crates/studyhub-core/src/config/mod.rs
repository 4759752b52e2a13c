//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod cache;
pub mod logging;
pub mod protocol;
pub mod scheduler;

use serde::{Deserialize, Serialize};

use self::cache::ScheduleCacheConfig;
use self::logging::LoggingConfig;
use self::protocol::ProtocolSourceConfig;
use self::scheduler::SchedulerConfig;

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Protocol source settings.
    #[serde(default)]
    pub protocol: ProtocolSourceConfig,
    /// Schedule regeneration loop settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Per-subject schedule cache settings.
    #[serde(default)]
    pub cache: ScheduleCacheConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `STUDYHUB_`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("STUDYHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            protocol: ProtocolSourceConfig::default(),
            scheduler: SchedulerConfig::default(),
            cache: ScheduleCacheConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
