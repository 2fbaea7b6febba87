//! Local client settings (TOML, under the platform config dir).
//!
//! Not to be confused with [`crate::config::WatcherConfig`], which the
//! *service* owns and the client only mirrors.  These settings are ours:
//! where the service lives and how aggressively to poll it.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub polling: PollingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Base URL of the watcher service, without the `/api` prefix.
    pub base_url: String,
    /// Per-request timeout; a timed-out poll counts as an ordinary failure.
    pub request_timeout_secs: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:7502".to_string(),
            request_timeout_secs: 8,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    pub log_interval_ms: u64,
    pub status_interval_ms: u64,
    /// Consecutive failures tolerated before a stream gives up.
    pub max_retries: u32,
    /// Ceiling for the exponential retry delay.
    pub backoff_cap_ms: u64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        Self {
            log_interval_ms: 2000,
            status_interval_ms: 3000,
            max_retries: 5,
            backoff_cap_ms: 30_000,
        }
    }
}

impl PollingSettings {
    pub fn log_interval(&self) -> Duration {
        Duration::from_millis(self.log_interval_ms)
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }

    pub fn backoff_cap(&self) -> Duration {
        Duration::from_millis(self.backoff_cap_ms)
    }
}

impl Settings {
    /// Load settings, writing the defaults on first run so the operator has
    /// a file to edit.
    pub fn load() -> anyhow::Result<Self> {
        let settings_path = Self::settings_path();

        if !settings_path.exists() {
            let settings = Self::default();
            settings.save()?;
            return Ok(settings);
        }

        let content = std::fs::read_to_string(&settings_path)?;
        let settings: Self = toml::from_str(&content)?;
        Ok(settings)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let settings_path = Self::settings_path();
        if let Some(parent) = settings_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    pub fn settings_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }
}
