//! The two self-healing poll loops.
//!
//! Each stream is driven by exactly one owning task, which is what enforces
//! the at-most-one-in-flight rule: the next fetch is only issued after the
//! previous one has settled.  The cycle is fetch → reconcile → wait, where
//! the wait is the poll interval after a success, a backoff delay after a
//! failure, and cancellable either way.
//!
//! Stopping is cooperative.  `PollControl::stop` flips the active flag and
//! wakes a pending wait; a response already in flight is not aborted, but
//! the loop re-checks liveness before touching the store, so a late arrival
//! has no observable effect.  A generation counter guards the stop-then-
//! immediately-restart case: the old task sees its generation superseded and
//! exits even though the flag is up again.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use watchdash_proto::api::{CurrentStatus, RecentLogs, RecentLogsQuery};

use crate::backoff::RetryPolicy;
use crate::error::ClientError;
use crate::http::ApiClient;
use crate::store::{DashboardStore, Stream};

pub(crate) struct PollControl {
    active: AtomicBool,
    generation: AtomicU64,
    wake: Notify,
}

impl PollControl {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self {
            active: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            wake: Notify::new(),
        })
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Claim the stream.  `None` when a loop is already running.
    fn try_activate(&self) -> Option<u64> {
        if self.active.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Whether the loop spawned as generation `gen` should keep going.
    fn live(&self, gen: u64) -> bool {
        self.active.load(Ordering::SeqCst) && self.generation.load(Ordering::SeqCst) == gen
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    pub(crate) fn stop(&self) {
        self.deactivate();
        self.wake.notify_waiters();
    }

    /// Sleep up to `delay`, waking early on `stop`.  Returns liveness.
    async fn wait(&self, gen: u64, delay: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = self.wake.notified() => {}
        }
        self.live(gen)
    }
}

pub(crate) fn start_log_poller(
    control: Arc<PollControl>,
    api: Arc<ApiClient>,
    store: Arc<DashboardStore>,
    interval: Duration,
    policy: RetryPolicy,
) {
    let Some(gen) = control.try_activate() else {
        debug!("log poller already active, start ignored");
        return;
    };
    tokio::spawn(async move {
        run_log_loop(control, gen, api, store, interval, policy).await;
    });
}

pub(crate) fn start_status_poller(
    control: Arc<PollControl>,
    api: Arc<ApiClient>,
    store: Arc<DashboardStore>,
    interval: Duration,
    policy: RetryPolicy,
) {
    let Some(gen) = control.try_activate() else {
        debug!("status poller already active, start ignored");
        return;
    };
    tokio::spawn(async move {
        run_status_loop(control, gen, api, store, interval, policy).await;
    });
}

async fn run_log_loop(
    control: Arc<PollControl>,
    gen: u64,
    api: Arc<ApiClient>,
    store: Arc<DashboardStore>,
    interval: Duration,
    policy: RetryPolicy,
) {
    store.set_stream_active(Stream::Logs, true).await;
    info!(
        interval_ms = interval.as_millis() as u64,
        "log poller started"
    );
    let mut failures: u32 = 0;

    loop {
        if !control.live(gen) {
            break;
        }
        let cursor = store.log_cursor().await;
        let result = fetch_logs(&api, cursor.watermark).await;
        // Stopped while the request was in flight: drop whatever came back.
        if !control.live(gen) {
            break;
        }

        let wait = match result {
            Ok(window) => {
                let latest_id = window.latest_id;
                let appended = store
                    .ingest_logs(cursor.epoch, window.logs, latest_id)
                    .await;
                if appended > 0 {
                    debug!(appended, latest_id, "appended log entries");
                }
                failures = 0;
                store.reset_stream_failures(Stream::Logs).await;
                interval
            }
            Err(err) => {
                failures += 1;
                store.record_stream_failure(Stream::Logs, failures).await;
                match after_failure(Stream::Logs, failures, &policy, &err) {
                    Some(delay) => delay,
                    None => {
                        control.deactivate();
                        store.mark_stream_exhausted(Stream::Logs).await;
                        return;
                    }
                }
            }
        };

        if !control.wait(gen, wait).await {
            break;
        }
    }

    if !control.is_active() {
        store.set_stream_active(Stream::Logs, false).await;
    }
    info!("log poller stopped");
}

async fn run_status_loop(
    control: Arc<PollControl>,
    gen: u64,
    api: Arc<ApiClient>,
    store: Arc<DashboardStore>,
    interval: Duration,
    policy: RetryPolicy,
) {
    store.set_stream_active(Stream::Status, true).await;
    info!(
        interval_ms = interval.as_millis() as u64,
        "status poller started"
    );
    let mut failures: u32 = 0;

    loop {
        if !control.live(gen) {
            break;
        }
        let result = fetch_status(&api).await;
        if !control.live(gen) {
            break;
        }

        let wait = match result {
            Ok(snapshot) => {
                // Absent sub-objects mean "unchanged", not an error.
                if let Some(service) = snapshot.service_status {
                    store.set_service_status(service).await;
                }
                if let Some(patch) = snapshot.current_status {
                    store.merge_playback(patch).await;
                }
                failures = 0;
                store.reset_stream_failures(Stream::Status).await;
                interval
            }
            Err(err) => {
                failures += 1;
                store.record_stream_failure(Stream::Status, failures).await;
                match after_failure(Stream::Status, failures, &policy, &err) {
                    Some(delay) => delay,
                    None => {
                        control.deactivate();
                        store.mark_stream_exhausted(Stream::Status).await;
                        return;
                    }
                }
            }
        };

        if !control.wait(gen, wait).await {
            break;
        }
    }

    if !control.is_active() {
        store.set_stream_active(Stream::Status, false).await;
    }
    info!("status poller stopped");
}

/// One failed poll: pick the backoff delay, or `None` once the stream must
/// give up.
fn after_failure(
    stream: Stream,
    failures: u32,
    policy: &RetryPolicy,
    err: &ClientError,
) -> Option<Duration> {
    match policy.delay_for(failures) {
        Some(delay) => {
            warn!(
                stream = stream.label(),
                error = %err,
                attempt = failures,
                delay_ms = delay.as_millis() as u64,
                "poll failed, backing off"
            );
            Some(delay)
        }
        None => {
            error!(
                stream = stream.label(),
                error = %err,
                failures,
                "poll retries exhausted, disabling stream"
            );
            None
        }
    }
}

async fn fetch_logs(api: &ApiClient, since_id: u64) -> Result<RecentLogs, ClientError> {
    let query = RecentLogsQuery {
        since_id,
        limit: None,
    };
    let window: RecentLogs = api.get_json_with_query("/api/logs/recent", &query).await?;
    if !window.success {
        return Err(ClientError::Api("log window rejected".to_string()));
    }
    Ok(window)
}

async fn fetch_status(api: &ApiClient) -> Result<CurrentStatus, ClientError> {
    let snapshot: CurrentStatus = api.get_json("/api/status/current").await?;
    if !snapshot.success {
        return Err(ClientError::Api("status snapshot rejected".to_string()));
    }
    Ok(snapshot)
}
