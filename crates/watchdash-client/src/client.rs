//! `DashboardClient` — the facade consumers hold.
//!
//! Owns the API client, the reconciled store, and the two poll-stream
//! controls.  Command actions are two-phase: issue the mutating request,
//! then read the affected slot back and replace it wholesale, so the store
//! never holds a half-applied guess about server state.  On error nothing
//! is applied and the `ClientError` goes to the caller — actions are never
//! auto-retried, unlike the poll fetches.

use std::sync::Arc;

use tokio::sync::broadcast;

use watchdash_proto::api::{ConnectivityProbe, ServiceHealth};
use watchdash_proto::config::{ExtensionMonitoring, MappingKey, PathMapping, WatcherConfig};
use watchdash_proto::settings::Settings;
use watchdash_proto::status::ServiceStatus;

use crate::backoff::RetryPolicy;
use crate::error::ClientError;
use crate::http::ApiClient;
use crate::poller::{self, PollControl};
use crate::store::{DashboardStore, StoreEvent};

pub struct DashboardClient {
    api: Arc<ApiClient>,
    store: Arc<DashboardStore>,
    settings: Settings,
    log_control: Arc<PollControl>,
    status_control: Arc<PollControl>,
}

impl DashboardClient {
    pub fn new(settings: Settings) -> Result<Self, ClientError> {
        let api = Arc::new(ApiClient::new(&settings.server)?);
        Ok(Self {
            api,
            store: Arc::new(DashboardStore::new()),
            settings,
            log_control: PollControl::new(),
            status_control: PollControl::new(),
        })
    }

    pub fn store(&self) -> Arc<DashboardStore> {
        Arc::clone(&self.store)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.store.subscribe()
    }

    // ── polling control ───────────────────────────────────────────────────

    /// Start both streams.  Idempotent per stream; a stream that is already
    /// running keeps its schedule and watermark.
    pub fn start_polling(&self) {
        self.start_log_polling();
        self.start_status_polling();
    }

    pub fn stop_polling(&self) {
        self.stop_log_polling();
        self.stop_status_polling();
    }

    pub fn start_log_polling(&self) {
        let interval = self.settings.polling.log_interval();
        poller::start_log_poller(
            Arc::clone(&self.log_control),
            Arc::clone(&self.api),
            Arc::clone(&self.store),
            interval,
            RetryPolicy::new(interval, &self.settings.polling),
        );
    }

    pub fn start_status_polling(&self) {
        let interval = self.settings.polling.status_interval();
        poller::start_status_poller(
            Arc::clone(&self.status_control),
            Arc::clone(&self.api),
            Arc::clone(&self.store),
            interval,
            RetryPolicy::new(interval, &self.settings.polling),
        );
    }

    pub fn stop_log_polling(&self) {
        self.log_control.stop();
    }

    pub fn stop_status_polling(&self) {
        self.status_control.stop();
    }

    pub fn is_log_polling(&self) -> bool {
        self.log_control.is_active()
    }

    pub fn is_status_polling(&self) -> bool {
        self.status_control.is_active()
    }

    // ── one-shot reads ────────────────────────────────────────────────────

    /// Fetch the slow-moving slots once, typically right after connecting
    /// and before the pollers take over the fast-moving ones.
    pub async fn hydrate(&self) -> Result<(), ClientError> {
        self.refresh_service_status().await?;
        self.refresh_config().await?;
        self.refresh_mappings().await?;
        Ok(())
    }

    pub async fn refresh_service_status(&self) -> Result<ServiceStatus, ClientError> {
        let status: ServiceStatus = self.api.get_json("/api/service/status").await?;
        self.store.set_service_status(status.clone()).await;
        Ok(status)
    }

    pub async fn refresh_config(&self) -> Result<WatcherConfig, ClientError> {
        let config: WatcherConfig = self.api.get_json("/api/config").await?;
        self.store.set_config(config.clone()).await;
        Ok(config)
    }

    pub async fn refresh_mappings(&self) -> Result<Vec<PathMapping>, ClientError> {
        let mappings: Vec<PathMapping> = self.api.get_json("/api/mappings").await?;
        self.store.set_mappings(mappings.clone()).await;
        Ok(mappings)
    }

    /// Direct connectivity probe; not mirrored into the store (the status
    /// stream already carries connectivity).
    pub async fn connectivity(&self) -> Result<ConnectivityProbe, ClientError> {
        self.api.get_json("/api/service/connectivity").await
    }

    pub async fn health(&self) -> Result<ServiceHealth, ClientError> {
        self.api.get_json("/api/health").await
    }

    // ── command actions ───────────────────────────────────────────────────

    pub async fn start_service(&self) -> Result<(), ClientError> {
        self.api.post_ack("/api/service/start").await?;
        self.refresh_service_status().await?;
        Ok(())
    }

    pub async fn stop_service(&self) -> Result<(), ClientError> {
        self.api.post_ack("/api/service/stop").await?;
        self.refresh_service_status().await?;
        Ok(())
    }

    pub async fn update_config(&self, config: &WatcherConfig) -> Result<(), ClientError> {
        self.api.post_json_ack("/api/config", config).await?;
        self.refresh_config().await?;
        Ok(())
    }

    /// Replace all extension flags at once.
    pub async fn update_extension_monitoring(
        &self,
        flags: &ExtensionMonitoring,
    ) -> Result<(), ClientError> {
        self.api
            .put_json_ack("/api/extension-monitoring", flags)
            .await?;
        self.refresh_config().await?;
        Ok(())
    }

    /// Flip a single extension flag.  The endpoint takes a partial map, so
    /// other flags are untouched server-side.
    pub async fn toggle_extension_monitoring(
        &self,
        extension: &str,
        enable: bool,
    ) -> Result<(), ClientError> {
        let mut body = serde_json::Map::new();
        body.insert(extension.to_string(), serde_json::Value::Bool(enable));
        self.api
            .put_json_ack("/api/extension-monitoring", &body)
            .await?;
        self.refresh_config().await?;
        Ok(())
    }

    pub async fn add_path_mapping(
        &self,
        source: &str,
        target: &str,
        enable: bool,
    ) -> Result<(), ClientError> {
        let mapping = PathMapping {
            source: source.to_string(),
            target: target.to_string(),
            enable,
        };
        self.api.post_json_ack("/api/mappings", &mapping).await?;
        self.refresh_mappings().await?;
        Ok(())
    }

    pub async fn remove_path_mapping(&self, source: &str, target: &str) -> Result<(), ClientError> {
        let key = MappingKey {
            source: source.to_string(),
            target: target.to_string(),
        };
        self.api.delete_json_ack("/api/mappings", &key).await?;
        self.refresh_mappings().await?;
        Ok(())
    }

    pub async fn toggle_path_mapping(
        &self,
        source: &str,
        target: &str,
        enable: bool,
    ) -> Result<(), ClientError> {
        let mapping = PathMapping {
            source: source.to_string(),
            target: target.to_string(),
            enable,
        };
        self.api.put_json_ack("/api/mappings/toggle", &mapping).await?;
        self.refresh_mappings().await?;
        Ok(())
    }

    /// Clear the server's log stream, then the local buffer and cursor.
    /// The store bumps its clear-epoch here, which makes any log fetch
    /// already in flight discard its results on arrival.
    pub async fn clear_logs(&self) -> Result<(), ClientError> {
        self.api.post_ack("/api/logs/clear").await?;
        self.store.clear_logs().await;
        Ok(())
    }
}
