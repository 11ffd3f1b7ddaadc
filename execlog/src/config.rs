// Configuration management with layered configuration (file, env)

use crate::aggregation::fields::DEFAULT_MAX_BUCKETS_LIMIT;
use crate::version::Version;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub execution_log: ExecutionLogConfig,
    #[serde(default)]
    pub versions: VersionConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Missing keys fall back to `Default`, so a file may override a single value
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionLogConfig {
    /// Upper bound on buckets a single page may reach
    pub max_buckets_limit: u64,
    pub default_per_page: u64,
}

impl Default for ExecutionLogConfig {
    fn default() -> Self {
        Self {
            max_buckets_limit: DEFAULT_MAX_BUCKETS_LIMIT,
            default_per_page: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VersionConfig {
    /// Version of the running kibana, used as the upgrade ceiling
    pub kibana_version: String,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            kibana_version: "8.4.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Human,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
        }
    }
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("EXECLOG")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        let log = &self.execution_log;
        if log.max_buckets_limit == 0 {
            return Err("Execution log max_buckets_limit must be greater than 0".to_string());
        }
        if log.default_per_page == 0 {
            return Err("Execution log default_per_page must be greater than 0".to_string());
        }
        if log.default_per_page > log.max_buckets_limit {
            return Err(format!(
                "Execution log default_per_page ({}) cannot exceed max_buckets_limit ({})",
                log.default_per_page, log.max_buckets_limit
            ));
        }

        if Version::coerce(&self.versions.kibana_version).is_err() {
            return Err(format!(
                "Kibana version \"{}\" is not a valid version",
                self.versions.kibana_version
            ));
        }

        if self.observability.log_level.trim().is_empty() {
            return Err("Log level cannot be empty".to_string());
        }

        Ok(())
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            execution_log: ExecutionLogConfig::default(),
            versions: VersionConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}
