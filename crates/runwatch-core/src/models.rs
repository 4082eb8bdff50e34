//! Data models for runwatch: stream events and the projected view model.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Default number of loss-history points retained by a [`ViewModel`].
pub const DEFAULT_HISTORY_WINDOW: usize = 30;

/// One event observed on a task's event stream.
///
/// `Connecting` through `Failure` map 1:1 to wire frames. `Disconnected` and
/// `TransportFailed` are synthesized by the connection manager from the
/// transport lifecycle and never appear on the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskEvent {
    /// Subscription opened, no frame received yet.
    Connecting,
    /// Incremental progress tick from the worker.
    Progress(ProgressUpdate),
    /// Terminal: the task finished and produced a result payload.
    Success { result: serde_json::Value },
    /// Terminal: the task failed with a human-readable error.
    Failure { error: String },
    /// The stream closed before any terminal event arrived.
    Disconnected,
    /// The transport failed unrecoverably. The manager never retries;
    /// recovering requires a fresh subscription.
    TransportFailed { message: String },
}

impl TaskEvent {
    /// `Success` and `Failure` end a task for good.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskEvent::Success { .. } | TaskEvent::Failure { .. })
    }
}

/// Incremental progress payload for a running task.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressUpdate {
    pub status_text: String,
    pub epoch: u32,
    pub total_epochs: Option<u32>,
    pub loss: Option<f64>,
    pub validation: Option<ValidationSeries>,
}

/// Latest validation arrays for a task.
///
/// Replaced wholesale on every update that carries them, never merged
/// element-wise.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationSeries {
    /// Axis labels are opaque to us: the worker may send strings or numbers.
    #[serde(default)]
    pub x_axis: Vec<serde_json::Value>,
    #[serde(default)]
    pub y_true: Vec<f64>,
    #[serde(default)]
    pub y_pred: Vec<f64>,
}

/// Display phase of a tracked task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Phase {
    Connecting,
    Progress,
    Success,
    Failure,
    Disconnected,
    Error,
}

impl Phase {
    /// Once a task reaches `Success` or `Failure`, later stream events never
    /// change the projection.
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Success | Phase::Failure)
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Connecting => write!(f, "CONNECTING"),
            Phase::Progress => write!(f, "PROGRESS"),
            Phase::Success => write!(f, "SUCCESS"),
            Phase::Failure => write!(f, "FAILURE"),
            Phase::Disconnected => write!(f, "DISCONNECTED"),
            Phase::Error => write!(f, "ERROR"),
        }
    }
}

/// One retained loss sample, labelled by epoch (`"E12"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LossPoint {
    pub label: String,
    pub value: f64,
}

impl LossPoint {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Display-ready projection of one task's event stream.
///
/// Created fresh when a subscription begins and discarded when it ends; never
/// shared across tasks. Mutation happens only through
/// [`crate::projector::project`], which returns a new value per event, so two
/// models can be compared with `==`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModel {
    pub state: Phase,
    /// Last known human-readable status, shown verbatim by the renderer.
    pub status_text: String,
    pub epoch: u32,
    /// Sticky: a positive value is never cleared by a later tick without one.
    pub total_epochs: Option<u32>,
    /// At most [`ViewModel::window`] points, oldest evicted first, one entry
    /// per epoch label.
    pub loss_history: VecDeque<LossPoint>,
    pub validation: Option<ValidationSeries>,
    /// Terminal payload, present only once a `Success` event arrived.
    pub result: Option<serde_json::Value>,
    /// Failure or transport error message.
    pub error: Option<String>,
    window: usize,
}

impl ViewModel {
    /// Fresh model with the default history window.
    pub fn new() -> Self {
        Self::with_window(DEFAULT_HISTORY_WINDOW)
    }

    /// Fresh model retaining at most `window` loss points.
    pub fn with_window(window: usize) -> Self {
        Self {
            state: Phase::Connecting,
            status_text: String::new(),
            epoch: 0,
            total_epochs: None,
            loss_history: VecDeque::with_capacity(window),
            validation: None,
            result: None,
            error: None,
            window,
        }
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Default for ViewModel {
    fn default() -> Self {
        Self::new()
    }
}
