//! The reconciled state store — the single canonical view consumers read.
//!
//! Pollers and command actions are the only writers; consumers get cloned,
//! fully-formed snapshots and a broadcast channel of change notifications.
//! Each slot sits behind its own lock, and everything the log stream needs
//! to stay consistent (buffer, watermark, clear-epoch) shares one lock so
//! append/advance/clear are atomic.

use tokio::sync::{broadcast, Mutex, RwLock};
use tracing::debug;

use watchdash_proto::config::{PathMapping, WatcherConfig};
use watchdash_proto::logs::LogEntry;
use watchdash_proto::status::{PlaybackPatch, PlaybackStatus, ServiceStatus};

use crate::logs::LogBuffer;

/// The two poll streams, used to address per-stream health.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Logs,
    Status,
}

impl Stream {
    pub fn label(&self) -> &'static str {
        match self {
            Stream::Logs => "logs",
            Stream::Status => "status",
        }
    }
}

/// Change notifications for consumers.  Receivers that lag simply miss
/// events and re-read the store; every payload worth having lives there.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    ServiceStatusUpdated,
    PlaybackUpdated,
    LogsAppended(usize),
    LogsCleared,
    ConfigUpdated,
    MappingsUpdated,
    /// A poll stream exhausted its retries and disabled itself; data in the
    /// affected slots is stale until the stream is restarted.
    StreamStalled(Stream),
}

/// Observable health of one poll stream, for staleness indicators.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamHealth {
    pub active: bool,
    pub consecutive_failures: u32,
    pub exhausted: bool,
}

/// Cursor into the server's log sequence.  `epoch` increments on every
/// clear; a fetch started under an older epoch discards its results.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LogCursor {
    pub watermark: u64,
    pub epoch: u64,
}

struct LogState {
    buffer: LogBuffer,
    watermark: u64,
    epoch: u64,
}

#[derive(Default)]
struct HealthSlots {
    logs: StreamHealth,
    status: StreamHealth,
}

impl HealthSlots {
    fn slot(&mut self, stream: Stream) -> &mut StreamHealth {
        match stream {
            Stream::Logs => &mut self.logs,
            Stream::Status => &mut self.status,
        }
    }
}

pub struct DashboardStore {
    service: RwLock<ServiceStatus>,
    playback: RwLock<PlaybackStatus>,
    logs: Mutex<LogState>,
    config: RwLock<WatcherConfig>,
    mappings: RwLock<Vec<PathMapping>>,
    health: Mutex<HealthSlots>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for DashboardStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            service: RwLock::new(ServiceStatus::default()),
            playback: RwLock::new(PlaybackStatus::default()),
            logs: Mutex::new(LogState {
                buffer: LogBuffer::default(),
                watermark: 0,
                epoch: 0,
            }),
            config: RwLock::new(WatcherConfig::default()),
            mappings: RwLock::new(Vec::new()),
            health: Mutex::new(HealthSlots::default()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    // ── read accessors ────────────────────────────────────────────────────

    pub async fn service_status(&self) -> ServiceStatus {
        self.service.read().await.clone()
    }

    pub async fn playback_status(&self) -> PlaybackStatus {
        self.playback.read().await.clone()
    }

    /// Derived strictly from `ServiceStatus.is_running`.
    pub async fn is_running(&self) -> bool {
        self.service.read().await.is_running
    }

    pub async fn logs(&self) -> Vec<LogEntry> {
        self.logs.lock().await.buffer.snapshot()
    }

    pub async fn log_watermark(&self) -> u64 {
        self.logs.lock().await.watermark
    }

    pub async fn config(&self) -> WatcherConfig {
        self.config.read().await.clone()
    }

    pub async fn mappings(&self) -> Vec<PathMapping> {
        self.mappings.read().await.clone()
    }

    pub async fn stream_health(&self, stream: Stream) -> StreamHealth {
        self.health.lock().await.slot(stream).clone()
    }

    // ── setters (pollers and command actions only) ────────────────────────

    pub(crate) async fn set_service_status(&self, status: ServiceStatus) {
        *self.service.write().await = status;
        let _ = self.events.send(StoreEvent::ServiceStatusUpdated);
    }

    pub(crate) async fn merge_playback(&self, patch: PlaybackPatch) {
        self.playback.write().await.apply(patch);
        let _ = self.events.send(StoreEvent::PlaybackUpdated);
    }

    pub(crate) async fn set_config(&self, config: WatcherConfig) {
        *self.config.write().await = config;
        let _ = self.events.send(StoreEvent::ConfigUpdated);
    }

    pub(crate) async fn set_mappings(&self, mappings: Vec<PathMapping>) {
        *self.mappings.write().await = mappings;
        let _ = self.events.send(StoreEvent::MappingsUpdated);
    }

    pub(crate) async fn log_cursor(&self) -> LogCursor {
        let state = self.logs.lock().await;
        LogCursor {
            watermark: state.watermark,
            epoch: state.epoch,
        }
    }

    /// Reconcile one fetched log window.  `cursor_epoch` is the epoch the
    /// fetch was issued under; if the stream was cleared in the meantime the
    /// whole batch is stale and dropped.  The watermark advances to the
    /// server's cursor even when nothing was appended.
    pub(crate) async fn ingest_logs(
        &self,
        cursor_epoch: u64,
        entries: Vec<LogEntry>,
        latest_id: u64,
    ) -> usize {
        let mut state = self.logs.lock().await;
        if state.epoch != cursor_epoch {
            debug!(
                discarded = entries.len(),
                "log window fetched before a clear, dropping"
            );
            return 0;
        }

        let cutoff = state.watermark;
        state.buffer.seed_sequence(cutoff);
        let mut appended = 0usize;
        let mut max_id = cutoff;
        for entry in entries {
            // The server may resend a window we already consumed.
            if entry.id != 0 && entry.id <= cutoff {
                continue;
            }
            let id = state.buffer.push(entry);
            if id > max_id {
                max_id = id;
            }
            appended += 1;
        }
        state.watermark = max_id.max(latest_id);
        drop(state);

        if appended > 0 {
            let _ = self.events.send(StoreEvent::LogsAppended(appended));
        }
        appended
    }

    /// Empty the buffer and reset the cursor.  Bumping the epoch invalidates
    /// any fetch currently in flight.
    pub(crate) async fn clear_logs(&self) {
        let mut state = self.logs.lock().await;
        state.buffer.clear();
        state.watermark = 0;
        state.epoch += 1;
        drop(state);
        let _ = self.events.send(StoreEvent::LogsCleared);
    }

    // ── stream health ─────────────────────────────────────────────────────

    pub(crate) async fn set_stream_active(&self, stream: Stream, active: bool) {
        let mut health = self.health.lock().await;
        let slot = health.slot(stream);
        slot.active = active;
        if active {
            // A (re)start forgives past failures.
            slot.consecutive_failures = 0;
            slot.exhausted = false;
        }
    }

    pub(crate) async fn record_stream_failure(&self, stream: Stream, failures: u32) {
        self.health.lock().await.slot(stream).consecutive_failures = failures;
    }

    pub(crate) async fn reset_stream_failures(&self, stream: Stream) {
        self.health.lock().await.slot(stream).consecutive_failures = 0;
    }

    pub(crate) async fn mark_stream_exhausted(&self, stream: Stream) {
        {
            let mut health = self.health.lock().await;
            let slot = health.slot(stream);
            slot.active = false;
            slot.exhausted = true;
        }
        let _ = self.events.send(StoreEvent::StreamStalled(stream));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchdash_proto::status::{Connectivity, PlaybackState};

    fn entry(id: u64) -> LogEntry {
        serde_json::from_str(&format!(r#"{{"id": {id}, "message": "m{id}"}}"#)).unwrap()
    }

    #[tokio::test]
    async fn test_service_status_replaced_wholesale() {
        let store = DashboardStore::new();
        store
            .set_service_status(ServiceStatus {
                is_running: true,
                last_status: Some("playing".into()),
                ..Default::default()
            })
            .await;
        assert!(store.is_running().await);

        // A later fetch without the optional fields clears them — the server
        // owns the whole object.
        store
            .set_service_status(ServiceStatus {
                is_running: false,
                ..Default::default()
            })
            .await;
        let status = store.service_status().await;
        assert!(!status.is_running);
        assert!(status.last_status.is_none());
    }

    #[tokio::test]
    async fn test_playback_merge_keeps_unrelated_fields() {
        let store = DashboardStore::new();
        let full: PlaybackPatch = serde_json::from_str(
            r#"{"status": "playing", "position": 0, "duration": 100,
                "connectivity": "online"}"#,
        )
        .unwrap();
        store.merge_playback(full).await;

        let partial: PlaybackPatch = serde_json::from_str(r#"{"position": 42}"#).unwrap();
        store.merge_playback(partial).await;

        let playback = store.playback_status().await;
        assert_eq!(playback.position, 42.0);
        assert_eq!(playback.duration, 100.0);
        assert_eq!(playback.status, PlaybackState::Playing);
        assert_eq!(playback.connectivity, Connectivity::Online);
    }

    #[tokio::test]
    async fn test_ingest_advances_watermark_without_entries() {
        let store = DashboardStore::new();
        let cursor = store.log_cursor().await;
        let appended = store.ingest_logs(cursor.epoch, Vec::new(), 41).await;
        assert_eq!(appended, 0);
        assert_eq!(store.log_watermark().await, 41);
    }

    #[tokio::test]
    async fn test_ingest_skips_already_consumed_ids() {
        let store = DashboardStore::new();
        let cursor = store.log_cursor().await;
        store
            .ingest_logs(cursor.epoch, vec![entry(1), entry(2)], 2)
            .await;

        // Overlapping window: 1 and 2 again plus a new 3.
        let cursor = store.log_cursor().await;
        let appended = store
            .ingest_logs(cursor.epoch, vec![entry(1), entry(2), entry(3)], 3)
            .await;
        assert_eq!(appended, 1);
        assert_eq!(store.logs().await.len(), 3);
        assert_eq!(store.log_watermark().await, 3);
    }

    #[tokio::test]
    async fn test_stale_epoch_batch_is_dropped() {
        let store = DashboardStore::new();
        let cursor = store.log_cursor().await;

        // Clear lands while the fetch is in flight.
        store.clear_logs().await;

        let appended = store
            .ingest_logs(cursor.epoch, vec![entry(1), entry(2)], 2)
            .await;
        assert_eq!(appended, 0);
        assert!(store.logs().await.is_empty());
        assert_eq!(store.log_watermark().await, 0);
    }

    #[tokio::test]
    async fn test_clear_resets_cursor() {
        let store = DashboardStore::new();
        let cursor = store.log_cursor().await;
        store.ingest_logs(cursor.epoch, vec![entry(5)], 5).await;
        assert_eq!(store.log_watermark().await, 5);

        store.clear_logs().await;
        assert!(store.logs().await.is_empty());
        assert_eq!(store.log_watermark().await, 0);
        assert_eq!(store.log_cursor().await.epoch, cursor.epoch + 1);
    }

    #[tokio::test]
    async fn test_restart_clears_exhaustion() {
        let store = DashboardStore::new();
        store.record_stream_failure(Stream::Logs, 5).await;
        store.mark_stream_exhausted(Stream::Logs).await;
        let health = store.stream_health(Stream::Logs).await;
        assert!(!health.active);
        assert!(health.exhausted);

        store.set_stream_active(Stream::Logs, true).await;
        let health = store.stream_health(Stream::Logs).await;
        assert!(health.active);
        assert!(!health.exhausted);
        assert_eq!(health.consecutive_failures, 0);

        // The status stream's health is untouched throughout.
        assert_eq!(
            store.stream_health(Stream::Status).await,
            StreamHealth::default()
        );
    }
}
