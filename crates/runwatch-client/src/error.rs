//! Error types for runwatch-client.

use thiserror::Error;

/// Caller errors, reported synchronously from [`crate::StreamManager::open`].
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WatchError {
    #[error("task id must not be empty")]
    InvalidTaskId,
}

/// Transport-level failures. Never raised at the consumer: the manager turns
/// them into a terminal `TransportFailed` event on the channel.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("receive failed: {0}")]
    Recv(String),
}
