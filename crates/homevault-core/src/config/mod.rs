//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section; every field has a default so an empty file is a valid setup.

pub mod database;
pub mod logging;
pub mod media;
pub mod processing;
pub mod scan;
pub mod storage;

use serde::{Deserialize, Serialize};

pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::media::MediaConfig;
pub use self::processing::ProcessingConfig;
pub use self::scan::ScanConfig;
pub use self::storage::{IngestMode, StorageConfig};

use crate::error::AppError;

/// Root application configuration.
///
/// Top-level deserialization target for the merged TOML configuration
/// files (default.toml + environment overlay + `HOMEVAULT__` variables).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Catalog database settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Physical storage layout settings.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Processing queue settings.
    #[serde(default)]
    pub processing: ProcessingConfig,
    /// External media tool settings.
    #[serde(default)]
    pub media: MediaConfig,
    /// Reconciliation scanner settings.
    #[serde(default)]
    pub scan: ScanConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges `config/default.toml` with an environment-specific overlay
    /// and environment variables prefixed with `HOMEVAULT__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("HOMEVAULT")
                    .prefix_separator("__")
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
