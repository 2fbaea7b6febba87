//! JSON envelopes and query/body types for the watcher service's API.

use serde::{Deserialize, Serialize};

use crate::logs::LogEntry;
use crate::status::{PlaybackPatch, ServiceStatus};

/// Response of `GET /api/logs/recent`.
///
/// `latest_id` is the server's cursor after this window, reported even when
/// `logs` is empty — the client tracks it, not just the ids it appended.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RecentLogs {
    pub success: bool,
    pub logs: Vec<LogEntry>,
    pub latest_id: u64,
}

/// Response of `GET /api/status/current`.  Either sub-object may be absent,
/// which means "unchanged" rather than an error.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CurrentStatus {
    pub success: bool,
    pub service_status: Option<ServiceStatus>,
    pub current_status: Option<PlaybackPatch>,
    pub timestamp: Option<f64>,
}

/// Generic `{success, message}` acknowledgement returned by every mutating
/// endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Ack {
    pub success: bool,
    pub message: Option<String>,
}

/// Response of `GET /api/service/connectivity`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConnectivityProbe {
    pub is_online: bool,
    pub consecutive_errors: u32,
    pub base_url: String,
}

/// Response of `GET /api/health`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceHealth {
    pub status: String,
    pub version: Option<String>,
}

/// Query string of `GET /api/logs/recent`.  `since_id = 0` asks for the
/// initial window (the service replies with its most recent entries).
#[derive(Debug, Clone, Copy, Serialize)]
pub struct RecentLogsQuery {
    pub since_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}
