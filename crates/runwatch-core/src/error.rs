//! Error types for runwatch-core.

use thiserror::Error;

/// A wire frame that could not be turned into a [`crate::TaskEvent`].
///
/// Decode failures are never fatal to a subscription: the connection manager
/// drops the frame and keeps reading.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame has no state field")]
    MissingState,

    #[error("unknown state tag: {0}")]
    UnknownState(String),

    #[error("PROGRESS frame has no usable epoch")]
    MissingEpoch,
}
