//! The stream connection manager: subscription lifecycle and event dispatch.
//!
//! `open()` is a synchronous handshake — validate the task id, close any
//! previous subscription, queue [`TaskEvent::Connecting`], spawn the worker —
//! so the consumer registers once and returns immediately. All I/O happens on
//! the worker task, which owns the frame stream; every exit path drops it,
//! releasing the connection.

use std::sync::Arc;

use futures_util::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use runwatch_core::{project, wire, TaskEvent, ViewModel};

use crate::error::WatchError;
use crate::transport::Transport;

/// Owns at most one live subscription to a task event stream.
///
/// Opening another task first closes the previous subscription, so a consumer
/// can retarget freely without leaking connections. The manager never reads
/// or mutates the consumer's view model; it only supplies events.
pub struct StreamManager<T> {
    transport: Arc<T>,
    active: Option<ActiveSubscription>,
}

struct ActiveSubscription {
    task_id: String,
    cancel: CancellationToken,
}

impl<T: Transport> StreamManager<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Arc::new(transport),
            active: None,
        }
    }

    /// Subscribe to `task_id`.
    ///
    /// Dispatch starts immediately with [`TaskEvent::Connecting`]; the
    /// connection itself is established on the worker, and a connect failure
    /// arrives as [`TaskEvent::TransportFailed`] on the channel. Fails with
    /// [`WatchError::InvalidTaskId`] before any connection attempt if
    /// `task_id` is empty.
    pub fn open(&mut self, task_id: &str) -> Result<Subscription, WatchError> {
        if task_id.is_empty() {
            return Err(WatchError::InvalidTaskId);
        }

        // At most one live subscription: retargeting closes the old one.
        self.close();

        let cancel = CancellationToken::new();
        let (events, receiver) = mpsc::unbounded_channel();

        let _ = events.send(TaskEvent::Connecting);

        tokio::spawn(run_subscription(
            Arc::clone(&self.transport),
            task_id.to_string(),
            events,
            cancel.clone(),
        ));

        info!(task = %task_id, "subscription opened");
        self.active = Some(ActiveSubscription {
            task_id: task_id.to_string(),
            cancel: cancel.clone(),
        });

        Ok(Subscription {
            task_id: task_id.to_string(),
            events: receiver,
            cancel,
        })
    }

    /// Close the live subscription, if any. Idempotent; safe when the remote
    /// side already closed.
    pub fn close(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            info!(task = %active.task_id, "subscription closed");
        }
    }

    /// Task id of the live subscription, if any.
    pub fn active_task(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.task_id.as_str())
    }
}

impl<T> Drop for StreamManager<T> {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
        }
    }
}

/// Consumer handle for one task subscription.
///
/// Receives [`TaskEvent`]s in transport-delivery order. Dropping the handle,
/// like [`Subscription::close`], cancels the worker and releases the
/// connection.
#[derive(Debug)]
pub struct Subscription {
    task_id: String,
    events: mpsc::UnboundedReceiver<TaskEvent>,
    cancel: CancellationToken,
}

impl Subscription {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Next event, or `None` once the stream ended or the subscription was
    /// closed. Events still in flight when `close` ran are discarded, not
    /// delivered.
    pub async fn recv(&mut self) -> Option<TaskEvent> {
        if self.cancel.is_cancelled() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            event = self.events.recv() => event,
        }
    }

    /// Stop dispatch. Idempotent; safe after the remote side already closed.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Fold received events through the progress projector, yielding the
    /// projected [`ViewModel`] after each one. `window` bounds the loss
    /// history.
    pub fn into_view_models(self, window: usize) -> impl Stream<Item = ViewModel> {
        futures_util::stream::unfold(
            (self, ViewModel::with_window(window)),
            |(mut sub, model)| async move {
                let event = sub.recv().await?;
                let next = project(&model, &event);
                Some((next.clone(), (sub, next)))
            },
        )
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ─── Worker ──────────────────────────────────────────────────────────────────

async fn run_subscription<T: Transport>(
    transport: Arc<T>,
    task_id: String,
    events: mpsc::UnboundedSender<TaskEvent>,
    cancel: CancellationToken,
) {
    let mut frames = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        connected = transport.connect(&task_id) => match connected {
            Ok(frames) => frames,
            Err(err) => {
                warn!(task = %task_id, error = %err, "connect failed");
                let _ = events.send(TaskEvent::TransportFailed {
                    message: err.to_string(),
                });
                return;
            }
        },
    };

    let mut terminal_seen = false;

    loop {
        let frame = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(task = %task_id, "subscription cancelled");
                return;
            }
            frame = frames.next() => frame,
        };

        match frame {
            // Clean remote close: expected after a terminal event, premature
            // otherwise.
            None => {
                if !terminal_seen {
                    let _ = events.send(TaskEvent::Disconnected);
                }
                return;
            }
            Some(Err(err)) => {
                if terminal_seen {
                    debug!(task = %task_id, error = %err, "transport error after terminal event");
                } else {
                    warn!(task = %task_id, error = %err, "transport error");
                    let _ = events.send(TaskEvent::TransportFailed {
                        message: err.to_string(),
                    });
                }
                return;
            }
            Some(Ok(text)) => match wire::decode(&text) {
                Ok(event) => {
                    terminal_seen |= event.is_terminal();
                    if events.send(event).is_err() {
                        // Consumer dropped the receiver; nothing left to do.
                        debug!(task = %task_id, "consumer gone, stopping dispatch");
                        return;
                    }
                }
                Err(err) => {
                    warn!(task = %task_id, error = %err, "dropping malformed frame");
                }
            },
        }
    }
}
