use anyhow::Result;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::api::DEFAULT_API_BASE;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub scheduler: SchedulerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub workers: usize,
    pub tick_interval_ms: u64,
    /// Timezone used to render publish times in status messages.
    pub timezone: Tz,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub settings_path: PathBuf,
    pub schedule_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: DEFAULT_API_BASE.to_string(),
            },
            scheduler: SchedulerConfig {
                workers: 4,
                tick_interval_ms: 1000,
                timezone: chrono_tz::Asia::Tehran,
            },
            storage: StorageConfig {
                settings_path: PathBuf::from("insta_settings.json"),
                schedule_path: PathBuf::from("insta_schedule.json"),
            },
        }
    }
}

impl Config {
    /// Load configuration from `path`, writing out the defaults on first run.
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(path, contents)?;
            Ok(default_config)
        }
    }
}
