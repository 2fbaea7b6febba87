use tracing::{info, warn};

use watchdash_client::{DashboardClient, StoreEvent};
use watchdash_proto::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Allow RUST_LOG override; default to info for app code but suppress
    // noisy connection-level output from HTTP client internals.
    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,hyper_util=warn,reqwest=warn,hyper=warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(log_filter.as_str())
        .init();

    let settings = Settings::load().unwrap_or_else(|e| {
        warn!("failed to load settings ({e}), using defaults");
        Settings::default()
    });
    info!(server = %settings.server.base_url, "watchdash starting");

    let client = DashboardClient::new(settings)?;
    let store = client.store();
    let mut events = client.subscribe();

    if let Err(e) = client.hydrate().await {
        warn!("initial hydration failed: {e} (polling will keep trying)");
    }
    client.start_polling();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
            event = events.recv() => {
                match event {
                    Ok(StoreEvent::ServiceStatusUpdated) => {
                        let status = store.service_status().await;
                        info!(
                            running = status.is_running,
                            paused = status.is_paused,
                            connectivity = ?status.device_connectivity,
                            "service status"
                        );
                    }
                    Ok(StoreEvent::PlaybackUpdated) => {
                        let playback = store.playback_status().await;
                        info!(
                            state = ?playback.status,
                            position = playback.position,
                            duration = playback.duration,
                            path = playback.video_path.as_deref().unwrap_or("-"),
                            "playback"
                        );
                    }
                    Ok(StoreEvent::LogsAppended(n)) => {
                        for entry in store.logs().await.iter().rev().take(n).rev() {
                            info!(level = entry.level.as_str(), "[{}] {}", entry.id, entry.message);
                        }
                    }
                    Ok(StoreEvent::StreamStalled(stream)) => {
                        warn!(stream = stream.label(), "poll stream gave up; data is stale");
                    }
                    Ok(_) => {}
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "event consumer lagging");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    client.stop_polling();
    Ok(())
}
