//! The progress projector: a pure fold from `(ViewModel, TaskEvent)` to the
//! next `ViewModel`.
//!
//! The fold is synchronous and deterministic — no clock, no I/O — and it
//! never fails: malformed input is rejected earlier, at the wire boundary.
//! The connection manager only supplies events; the consumer owns the model
//! and calls [`project`] for each one.

use crate::models::{LossPoint, Phase, ProgressUpdate, TaskEvent, ViewModel};

/// Fold one event into `current`, returning the next view model.
pub fn project(current: &ViewModel, event: &TaskEvent) -> ViewModel {
    // A terminal projection is frozen; only a fresh subscription starts over.
    if current.state.is_terminal() && !matches!(event, TaskEvent::Connecting) {
        return current.clone();
    }

    match event {
        TaskEvent::Connecting => ViewModel::with_window(current.window()),
        TaskEvent::Progress(update) => apply_progress(current, update),
        TaskEvent::Success { result } => {
            let mut next = current.clone();
            next.state = Phase::Success;
            next.result = Some(result.clone());
            next
        }
        TaskEvent::Failure { error } => {
            let mut next = current.clone();
            next.state = Phase::Failure;
            next.error = Some(error.clone());
            next
        }
        TaskEvent::Disconnected => {
            let mut next = current.clone();
            next.state = Phase::Disconnected;
            next
        }
        TaskEvent::TransportFailed { message } => {
            let mut next = current.clone();
            next.state = Phase::Error;
            next.error = Some(message.clone());
            next
        }
    }
}

fn apply_progress(current: &ViewModel, update: &ProgressUpdate) -> ViewModel {
    let mut next = current.clone();
    next.state = Phase::Progress;
    next.status_text = update.status_text.clone();
    next.epoch = update.epoch;

    // A positive total is sticky: a later tick without one never clears it.
    if let Some(total) = update.total_epochs {
        if total > 0 {
            next.total_epochs = Some(total);
        }
    }

    if let Some(loss) = update.loss {
        push_loss(&mut next, update.epoch, loss);
    }

    if let Some(validation) = &update.validation {
        // Replaced wholesale, never merged element-wise.
        next.validation = Some(validation.clone());
    }

    next
}

/// Append `(label, loss)` unless the label was already recorded; re-sent
/// ticks keep the first observed value. Evicts the oldest point once the
/// window is full.
fn push_loss(model: &mut ViewModel, epoch: u32, loss: f64) {
    if model.window() == 0 {
        return;
    }
    let label = format!("E{epoch}");
    if model.loss_history.iter().any(|p| p.label == label) {
        return;
    }
    if model.loss_history.len() == model.window() {
        model.loss_history.pop_front();
    }
    model.loss_history.push_back(LossPoint::new(label, loss));
}
