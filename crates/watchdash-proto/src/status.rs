//! Service and playback status as mirrored from the watcher service.
//!
//! `ServiceStatus` is replaced wholesale on every successful fetch — the
//! server owns the whole object.  `PlaybackStatus` is different: the service
//! sends partial snapshots (an offline snapshot has no `video_path`, a
//! playing one has no `message`), so updates arrive as a [`PlaybackPatch`]
//! and are merged field by field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timestamp;

/// Reachability of the watched playback device, as reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    Online,
    Offline,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Coarse playback state.  `Offline` and `Error` are real states the service
/// emits while the device is unreachable, not transport failures on our side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
    Offline,
    Error,
    /// A state string this client does not know about yet.
    #[serde(other)]
    Unknown,
}

/// Watcher service status.  Server-authoritative: every successful status
/// fetch replaces the whole object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceStatus {
    pub is_running: bool,
    pub is_paused: bool,
    pub last_status: Option<String>,
    pub last_notified_path: Option<String>,
    pub device_connectivity: Connectivity,
}

/// The reconciled playback view.  Always fully formed: every field holds
/// either the most recent server value or its initial default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackStatus {
    pub status: PlaybackState,
    pub video_path: Option<String>,
    pub zidoo_status: Option<i64>,
    pub title: Option<String>,
    pub position: f64,
    pub duration: f64,
    pub message: Option<String>,
    #[serde(deserialize_with = "timestamp::de_opt")]
    pub timestamp: Option<DateTime<Utc>>,
    pub connectivity: Connectivity,
}

/// A partial playback snapshot.  Every field is optional; for the nullable
/// ones the outer `Option` records key presence so an explicit null can
/// clear a value while an absent key leaves it untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlaybackPatch {
    pub status: Option<PlaybackState>,
    pub video_path: Option<Option<String>>,
    pub zidoo_status: Option<Option<i64>>,
    pub title: Option<Option<String>>,
    pub position: Option<f64>,
    pub duration: Option<f64>,
    pub message: Option<Option<String>>,
    #[serde(deserialize_with = "timestamp::de_patch")]
    pub timestamp: Option<Option<DateTime<Utc>>>,
    pub connectivity: Option<Connectivity>,
}

impl PlaybackStatus {
    /// Merge a partial snapshot into the current view.  Only keys present in
    /// the patch overwrite; everything else keeps its prior value.
    pub fn apply(&mut self, patch: PlaybackPatch) {
        if let Some(v) = patch.status {
            self.status = v;
        }
        if let Some(v) = patch.video_path {
            self.video_path = v;
        }
        if let Some(v) = patch.zidoo_status {
            self.zidoo_status = v;
        }
        if let Some(v) = patch.title {
            self.title = v;
        }
        if let Some(v) = patch.position {
            self.position = v;
        }
        if let Some(v) = patch.duration {
            self.duration = v;
        }
        if let Some(v) = patch.message {
            self.message = v;
        }
        if let Some(v) = patch.timestamp {
            self.timestamp = v;
        }
        if let Some(v) = patch.connectivity {
            self.connectivity = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_preserves_absent_fields() {
        let mut current = PlaybackStatus {
            position: 0.0,
            duration: 100.0,
            title: Some("Feature".into()),
            ..Default::default()
        };
        let patch: PlaybackPatch = serde_json::from_str(r#"{"position": 42}"#).unwrap();
        current.apply(patch);
        assert_eq!(current.position, 42.0);
        assert_eq!(current.duration, 100.0);
        assert_eq!(current.title.as_deref(), Some("Feature"));
    }

    #[test]
    fn test_merge_null_clears_value() {
        let mut current = PlaybackStatus {
            video_path: Some("/media/movie.mkv".into()),
            ..Default::default()
        };
        let patch: PlaybackPatch =
            serde_json::from_str(r#"{"status": "stopped", "video_path": null}"#).unwrap();
        current.apply(patch);
        assert_eq!(current.status, PlaybackState::Stopped);
        assert!(current.video_path.is_none());
    }

    #[test]
    fn test_offline_snapshot_shape() {
        // The service emits this exact shape while the device is unreachable.
        let patch: PlaybackPatch = serde_json::from_str(
            r#"{"status": "offline", "message": "device offline",
                "connectivity": "offline", "timestamp": 1700000000.0}"#,
        )
        .unwrap();
        let mut current = PlaybackStatus {
            status: PlaybackState::Playing,
            position: 17.0,
            duration: 7200.0,
            ..Default::default()
        };
        current.apply(patch);
        assert_eq!(current.status, PlaybackState::Offline);
        assert_eq!(current.connectivity, Connectivity::Offline);
        assert_eq!(current.message.as_deref(), Some("device offline"));
        // Fields the offline snapshot does not carry stay put.
        assert_eq!(current.position, 17.0);
        assert_eq!(current.duration, 7200.0);
    }

    #[test]
    fn test_unknown_enum_strings_are_tolerated() {
        let patch: PlaybackPatch =
            serde_json::from_str(r#"{"status": "buffering", "connectivity": "flaky"}"#).unwrap();
        assert_eq!(patch.status, Some(PlaybackState::Unknown));
        assert_eq!(patch.connectivity, Some(Connectivity::Unknown));
    }

    #[test]
    fn test_service_status_decodes_service_shape() {
        let status: ServiceStatus = serde_json::from_str(
            r#"{"is_running": true, "is_paused": false, "last_status": "playing",
                "last_notified_path": "/media/movie.mkv",
                "device_connectivity": "online"}"#,
        )
        .unwrap();
        assert!(status.is_running);
        assert_eq!(status.device_connectivity, Connectivity::Online);
    }
}
