//! Error taxonomy for the dashboard engine.
//!
//! A poll failure of any kind is retried with backoff and never propagates
//! to consumers; the same error from a command action is returned to the
//! caller untouched.  The variants only record *what* went wrong — the
//! retry-or-propagate decision belongs to the call site.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Connection, DNS, or timeout failure before a response arrived.
    #[error("http transport: {0}")]
    Transport(#[from] reqwest::Error),

    /// The service answered with a non-success HTTP status.
    #[error("{path} returned {status}")]
    Status {
        path: String,
        status: reqwest::StatusCode,
    },

    /// The body was not the shape we expected.
    #[error("decoding {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    /// A well-formed `{success: false}` envelope.
    #[error("service rejected request: {0}")]
    Api(String),
}

impl ClientError {
    /// Whether a 5xx/transport-level retry could plausibly help.  Used for
    /// log phrasing only — pollers retry everything, actions retry nothing.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Transport(_) => true,
            ClientError::Status { status, .. } => status.is_server_error(),
            ClientError::Decode { .. } => false,
            ClientError::Api(_) => false,
        }
    }
}
