//! runwatch-client: stream connection manager for live training tasks.
//!
//! One [`StreamManager`] owns at most one live subscription at a time.
//! Opening a task spawns a worker that reads text frames from the
//! [`Transport`], decodes them with `runwatch-core`, and forwards
//! [`runwatch_core::TaskEvent`]s over a single-consumer channel. The worker
//! synthesizes `Disconnected` and `TransportFailed` from the transport
//! lifecycle, so consumers only ever fold `TaskEvent`s.

pub mod error;
pub mod manager;
pub mod transport;

pub use error::{TransportError, WatchError};
pub use manager::{StreamManager, Subscription};
pub use transport::{FrameStream, Transport};
