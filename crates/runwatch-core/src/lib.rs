//! runwatch-core: event model and progress projection for live training tasks.
//!
//! Everything in this crate is deterministic and I/O-free: JSON text frames
//! decode into [`TaskEvent`] values, and [`projector::project`] folds those
//! events into a bounded, display-ready [`ViewModel`]. The connection
//! lifecycle lives in `runwatch-client`.

pub mod error;
pub mod models;
pub mod projector;
pub mod wire;

pub use error::DecodeError;
pub use models::{
    LossPoint, Phase, ProgressUpdate, TaskEvent, ValidationSeries, ViewModel,
    DEFAULT_HISTORY_WINDOW,
};
pub use projector::project;
pub use wire::decode;
