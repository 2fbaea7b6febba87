//! Dashboard engine for a remote media-playback watcher service.
//!
//! Two self-healing poll loops (log tail, composite status) reconcile server
//! responses into a [`store::DashboardStore`]; one-shot command actions
//! mutate the server and read the result back.  Consumers read snapshots
//! from the store, subscribe to its events, and call action methods — they
//! never write state themselves.

pub mod backoff;
pub mod client;
pub mod error;
pub mod http;
pub mod logs;
mod poller;
pub mod store;

pub use backoff::RetryPolicy;
pub use client::DashboardClient;
pub use error::ClientError;
pub use store::{DashboardStore, StoreEvent, Stream, StreamHealth};
