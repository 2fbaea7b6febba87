//! Server-owned configuration mirrored by the client.
//!
//! These objects belong to the watcher service.  The client reads them via
//! `GET /api/config` / `GET /api/mappings`, writes them back through command
//! actions, and replaces its local copy wholesale on every fetch — there is
//! deliberately no merge here, unlike playback status.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub enable_watcher: bool,
    /// Poll interval of the service's own device heartbeat, in milliseconds.
    pub heart_rate: u32,
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enable_watcher: true,
            heart_rate: 500,
            log_level: "INFO".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZidooConfig {
    pub ip: String,
    pub api_path: String,
}

impl Default for ZidooConfig {
    fn default() -> Self {
        Self {
            ip: "192.168.1.99".to_string(),
            api_path: "/ZidooVideoPlay/getPlayStatus".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    pub endpoint: String,
    pub timeout_seconds: u32,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://192.168.1.50:7507/play".to_string(),
            timeout_seconds: 10,
        }
    }
}

/// Which container extensions the service watches for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtensionMonitoring {
    pub bdmv: bool,
    pub iso: bool,
    pub mkv: bool,
    pub mp4: bool,
}

impl Default for ExtensionMonitoring {
    fn default() -> Self {
        Self {
            bdmv: true,
            iso: true,
            mkv: false,
            mp4: false,
        }
    }
}

/// The full configuration document served by `GET /api/config`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub general: GeneralConfig,
    pub zidoo: ZidooConfig,
    pub notification: NotificationConfig,
    pub extension_monitoring: ExtensionMonitoring,
}

/// One source→target path rewrite rule.  Doubles as the request body for
/// `POST /api/mappings` and `PUT /api/mappings/toggle`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathMapping {
    pub source: String,
    pub target: String,
    #[serde(default = "default_enable")]
    pub enable: bool,
}

fn default_enable() -> bool {
    true
}

/// Identifies a mapping without its enable flag — the body of
/// `DELETE /api/mappings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingKey {
    pub source: String,
    pub target: String,
}
