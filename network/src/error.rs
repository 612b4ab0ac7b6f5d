use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("could not connect to {url} after {attempts} attempts: {reason}")]
    ConnectionFailed {
        url: String,
        attempts: u32,
        reason: String,
    },

    #[error("ledger node went offline: no answer to {command} within {after:?}")]
    Offline {
        command: String,
        after: Duration,
    },

    #[error("connection closed")]
    Closed,

    #[error("failed to send request: {0}")]
    Send(String),

    #[error("{command} failed: {error} ({})", .message.as_deref().unwrap_or("no message"))]
    Rpc {
        command: String,
        error: String,
        message: Option<String>,
    },

    #[error("malformed {command} response: {reason}")]
    Malformed {
        command: String,
        reason: String,
    },
}
