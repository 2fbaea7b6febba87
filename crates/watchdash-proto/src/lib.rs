//! Wire types and shared plumbing for the watchdash dashboard client.
//!
//! Everything the engine and its consumers agree on lives here: the data
//! model mirrored from the watcher service, the JSON envelopes its API
//! speaks, the server-owned configuration types, and the client's own local
//! settings.

pub mod api;
pub mod config;
pub mod logs;
pub mod platform;
pub mod settings;
pub mod status;
pub(crate) mod timestamp;

pub use config::{ExtensionMonitoring, MappingKey, PathMapping, WatcherConfig};
pub use logs::{LogEntry, LogLevel};
pub use settings::Settings;
pub use status::{Connectivity, PlaybackPatch, PlaybackState, PlaybackStatus, ServiceStatus};
