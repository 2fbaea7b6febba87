//! Log entries as served by `/api/logs/recent`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timestamp;

/// Severity attached to a log entry.  Anything the service sends that we do
/// not recognise degrades to `Info` instead of failing the whole batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", from = "String")]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl From<String> for LogLevel {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBUG" => LogLevel::Debug,
            "WARNING" | "WARN" => LogLevel::Warning,
            "ERROR" => LogLevel::Error,
            _ => LogLevel::Info,
        }
    }
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

/// One entry from the service's rolling log stream.
///
/// `id` is the server-assigned monotonic sequence number; 0 means the server
/// did not assign one and the client will synthesise an id on append.  The
/// timestamp arrives as an epoch float from the service but older deployments
/// sent ISO-8601 strings; both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(default)]
    pub id: u64,
    #[serde(default = "default_kind", rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub level: LogLevel,
    pub message: String,
    #[serde(default, deserialize_with = "timestamp::de_opt")]
    pub timestamp: Option<DateTime<Utc>>,
}

fn default_kind() -> String {
    "log".to_string()
}
