use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::poll::{MergePolicy, StoreConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashConfig {
    /// Backend root, e.g. `http://localhost:8080`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Poll interval shared by every panel unless overridden.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Per-request HTTP timeout.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default)]
    pub headlines: PanelConfig,
    #[serde(default)]
    pub agent_status: PanelConfig,
    #[serde(default)]
    pub market_data: PanelConfig,
}

/// Polling settings for one panel.  Unset keys fall back to the global
/// interval and the panel's own merge policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PanelConfig {
    #[serde(default)]
    pub merge: Option<MergePolicy>,
    /// Overrides [`DashConfig::interval_ms`] for this panel.
    #[serde(default)]
    pub interval_ms: Option<u64>,
    /// Fetch once immediately instead of waiting for the first tick.
    #[serde(default)]
    pub eager: bool,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}
fn default_interval_ms() -> u64 {
    5000
}
fn default_timeout_ms() -> u64 {
    10_000
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            interval_ms: default_interval_ms(),
            timeout_ms: default_timeout_ms(),
            headlines: PanelConfig::default(),
            agent_status: PanelConfig::default(),
            market_data: PanelConfig::default(),
        }
    }
}

impl DashConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: DashConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::Invalid("interval_ms must be positive".into()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("timeout_ms must be positive".into()));
        }
        for (name, panel) in self.panels() {
            if panel.interval_ms == Some(0) {
                return Err(ConfigError::Invalid(format!(
                    "{name}.interval_ms must be positive"
                )));
            }
        }
        Ok(())
    }

    fn panels(&self) -> [(&'static str, &PanelConfig); 3] {
        [
            ("headlines", &self.headlines),
            ("agent_status", &self.agent_status),
            ("market_data", &self.market_data),
        ]
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn headlines_store(&self) -> StoreConfig {
        self.store_config(&self.headlines, MergePolicy::Replace)
    }

    /// The agent panel is a progress log, so it appends by default.
    pub fn agent_status_store(&self) -> StoreConfig {
        self.store_config(&self.agent_status, MergePolicy::Append)
    }

    pub fn market_data_store(&self) -> StoreConfig {
        self.store_config(&self.market_data, MergePolicy::Replace)
    }

    fn store_config(&self, panel: &PanelConfig, default_merge: MergePolicy) -> StoreConfig {
        let interval = Duration::from_millis(panel.interval_ms.unwrap_or(self.interval_ms));
        StoreConfig::new(interval, panel.merge.unwrap_or(default_merge)).eager(panel.eager)
    }
}
