//! Transport boundary: where text frames come from.
//!
//! The real event source — the platform's WebSocket endpoint — lives outside
//! this repository. Anything that can hand over a stream of JSON text frames
//! can back a subscription; tests use channel-backed streams.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error::TransportError;

/// A stream of text frames, one JSON event per item. Dropping it releases
/// the underlying connection.
pub type FrameStream = BoxStream<'static, Result<String, TransportError>>;

/// Connects to the event stream for one task.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn connect(&self, task_id: &str) -> Result<FrameStream, TransportError>;
}
