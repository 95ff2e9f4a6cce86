use analyst_api::{observability::LogConfig, DEFAULT_MAX_UPLOAD_BYTES};
use analyst_workflow::PipelineConfig;
use anyhow::{Context, Result};
use config::{Config as ConfigLoader, Environment, File};
use serde::Deserialize;
use std::time::Duration;
use validator::Validate;

/// Prefix for environment overrides, e.g. `DATA_ANALYST__PIPELINE__RENDER__MAX_CHARS`.
const ENV_PREFIX: &str = "DATA_ANALYST";

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    pub port: u16,
    pub log: LogConfig,
    #[validate(range(min = 1024))]
    pub max_upload_bytes: usize,
    /// Upper bound on one request, acquisition retries included
    #[validate(range(min = 1, max = 3600))]
    pub request_timeout_secs: u64,
    #[validate(nested)]
    pub pipeline: PipelineConfig,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from("config")
    }

    /// Layer `<dir>/default`, `<dir>/local` and the environment, then validate.
    pub fn load_from(dir: &str) -> Result<Self> {
        let config = ConfigLoader::builder()
            .add_source(File::with_name(&format!("{}/default", dir)).required(false))
            .add_source(File::with_name(&format!("{}/local", dir)).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("failed to read configuration")?;

        let config: Self = config
            .try_deserialize()
            .context("invalid configuration")?;
        config.validate().context("configuration failed validation")?;

        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8000,
            log: LogConfig::default(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            request_timeout_secs: 180,
            pipeline: PipelineConfig::default(),
        }
    }
}
