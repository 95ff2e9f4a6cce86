use analyst_core::DEFAULT_MAX_IMAGE_CHARS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use validator::Validate;

use crate::resilience::RetryConfig;

/// Settings shared by every stage of the analysis pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PipelineConfig {
    #[validate(nested)]
    pub acquisition: AcquisitionConfig,
    #[validate(nested)]
    pub render: RenderConfig,
    /// Characters of the task echoed back by the fallback response.
    #[validate(range(min = 1, max = 10000))]
    pub fallback_preview_chars: usize,
    /// Named datasets: catalog name -> URL or local file path.
    pub datasets: BTreeMap<String, String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            acquisition: AcquisitionConfig::default(),
            render: RenderConfig::default(),
            fallback_preview_chars: 100,
            datasets: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Per-request timeout.
    #[validate(range(min = 1, max = 600))]
    pub timeout_secs: u64,
    /// Total attempts for transient failures, including the first one.
    #[validate(range(min = 1, max = 10))]
    pub max_attempts: usize,
    #[validate(range(min = 1, max = 60000))]
    pub initial_backoff_ms: u64,
    #[validate(range(min = 1, max = 300000))]
    pub max_backoff_ms: u64,
    #[validate(range(min = 1.0, max = 10.0))]
    pub backoff_multiplier: f64,
    pub jitter: bool,
    #[validate(length(min = 1))]
    pub user_agent: String,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            max_attempts: 3,
            initial_backoff_ms: 250,
            max_backoff_ms: 4000,
            backoff_multiplier: 2.0,
            jitter: true,
            user_agent: concat!("data-analyst-agent/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl AcquisitionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            initial_delay: Duration::from_millis(self.initial_backoff_ms),
            max_delay: Duration::from_millis(self.max_backoff_ms),
            multiplier: self.backoff_multiplier,
            jitter: self.jitter,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RenderConfig {
    /// Ceiling applied when a chart question does not state one.
    #[validate(range(min = 1000))]
    pub max_chars: usize,
    #[validate(range(min = 160, max = 4000))]
    pub width: u32,
    #[validate(range(min = 120, max = 4000))]
    pub height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_IMAGE_CHARS,
            width: 800,
            height: 600,
        }
    }
}
