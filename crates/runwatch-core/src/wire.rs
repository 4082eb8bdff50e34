//! Wire boundary: JSON text frames from the event stream, decoded into
//! [`TaskEvent`] values.
//!
//! Each frame carries a `state` tag (`CONNECTING | PROGRESS | SUCCESS |
//! FAILURE`) plus optional `details`, `result`, and `error` fields. A field
//! absent on the wire stays absent — never zero or false. Optional fields of
//! the wrong type are coerced to absent; a frame that cannot parse, carries
//! an unknown `state`, or lacks the epoch counter on a `PROGRESS` frame is a
//! [`DecodeError`], which the connection manager drops without killing the
//! subscription.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::DecodeError;
use crate::models::{ProgressUpdate, TaskEvent, ValidationSeries};

#[derive(Deserialize)]
struct Frame {
    #[serde(default)]
    state: Option<Value>,
    #[serde(default)]
    details: Option<Value>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// Decode one text frame.
pub fn decode(text: &str) -> Result<TaskEvent, DecodeError> {
    let frame: Frame = serde_json::from_str(text)?;
    let state = frame
        .state
        .as_ref()
        .and_then(Value::as_str)
        .ok_or(DecodeError::MissingState)?;

    match state {
        "CONNECTING" => Ok(TaskEvent::Connecting),
        "PROGRESS" => Ok(TaskEvent::Progress(decode_progress(frame.details)?)),
        "SUCCESS" => Ok(TaskEvent::Success {
            result: frame.result.unwrap_or(Value::Null),
        }),
        "FAILURE" => Ok(TaskEvent::Failure {
            error: frame
                .error
                .as_ref()
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }),
        other => Err(DecodeError::UnknownState(other.to_string())),
    }
}

fn decode_progress(details: Option<Value>) -> Result<ProgressUpdate, DecodeError> {
    let details = match details {
        Some(Value::Object(map)) => map,
        _ => return Err(DecodeError::MissingEpoch),
    };

    // The epoch counter keys the loss history, so a tick without one is
    // unusable as a whole.
    let epoch = details
        .get("epoch")
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .ok_or(DecodeError::MissingEpoch)?;

    Ok(ProgressUpdate {
        status_text: details
            .get("status_text")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        epoch,
        total_epochs: field_u32(&details, "total_epochs"),
        loss: field_f64(&details, "loss"),
        validation: decode_validation(&details),
    })
}

fn field_f64(details: &Map<String, Value>, key: &str) -> Option<f64> {
    match details.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => {
            let parsed = value.as_f64();
            if parsed.is_none() {
                debug!(field = key, "non-numeric field treated as absent");
            }
            parsed
        }
    }
}

fn field_u32(details: &Map<String, Value>, key: &str) -> Option<u32> {
    match details.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => {
            let parsed = value.as_u64().and_then(|v| u32::try_from(v).ok());
            if parsed.is_none() {
                debug!(field = key, "non-numeric field treated as absent");
            }
            parsed
        }
    }
}

fn decode_validation(details: &Map<String, Value>) -> Option<ValidationSeries> {
    let raw = details.get("validation_data")?;
    if raw.is_null() {
        return None;
    }
    match serde_json::from_value::<ValidationSeries>(raw.clone()) {
        Ok(series) => Some(series),
        Err(err) => {
            debug!(error = %err, "malformed validation_data treated as absent");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_connecting() {
        let event = decode(r#"{"state": "CONNECTING"}"#).unwrap();
        assert_eq!(event, TaskEvent::Connecting);
    }

    #[test]
    fn test_decode_full_progress_frame() {
        let text = r#"{
            "state": "PROGRESS",
            "details": {
                "status_text": "Training epoch 3/10",
                "epoch": 3,
                "total_epochs": 10,
                "loss": 0.42,
                "validation_data": {
                    "x_axis": ["2024-01-01", "2024-01-02"],
                    "y_true": [1.0, 2.0],
                    "y_pred": [0.9, 2.1]
                }
            }
        }"#;
        let event = decode(text).unwrap();
        let TaskEvent::Progress(update) = event else {
            panic!("expected a progress event");
        };
        assert_eq!(update.status_text, "Training epoch 3/10");
        assert_eq!(update.epoch, 3);
        assert_eq!(update.total_epochs, Some(10));
        assert_eq!(update.loss, Some(0.42));
        let validation = update.validation.unwrap();
        assert_eq!(validation.y_true, [1.0, 2.0]);
        assert_eq!(validation.y_pred, [0.9, 2.1]);
        assert_eq!(validation.x_axis.len(), 2);
    }

    #[test]
    fn test_absent_fields_stay_absent() {
        let event = decode(r#"{"state": "PROGRESS", "details": {"epoch": 1}}"#).unwrap();
        let TaskEvent::Progress(update) = event else {
            panic!("expected a progress event");
        };
        assert_eq!(update.status_text, "");
        assert_eq!(update.total_epochs, None);
        assert_eq!(update.loss, None);
        assert_eq!(update.validation, None);
    }

    #[test]
    fn test_non_numeric_loss_treated_as_absent() {
        let text = r#"{"state": "PROGRESS", "details": {"epoch": 2, "loss": "oops"}}"#;
        let TaskEvent::Progress(update) = decode(text).unwrap() else {
            panic!("expected a progress event");
        };
        assert_eq!(update.epoch, 2);
        assert_eq!(update.loss, None);
    }

    #[test]
    fn test_malformed_validation_treated_as_absent() {
        let text = r#"{"state": "PROGRESS", "details": {"epoch": 2, "validation_data": {"y_true": "nope"}}}"#;
        let TaskEvent::Progress(update) = decode(text).unwrap() else {
            panic!("expected a progress event");
        };
        assert_eq!(update.validation, None);
    }

    #[test]
    fn test_progress_without_epoch_is_an_error() {
        let err = decode(r#"{"state": "PROGRESS", "details": {"loss": 0.1}}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MissingEpoch));

        let err = decode(r#"{"state": "PROGRESS"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::MissingEpoch));
    }

    #[test]
    fn test_decode_success_with_and_without_result() {
        let event = decode(r#"{"state": "SUCCESS", "result": {"accuracy": 0.93}}"#).unwrap();
        assert_eq!(
            event,
            TaskEvent::Success {
                result: serde_json::json!({"accuracy": 0.93})
            }
        );

        let event = decode(r#"{"state": "SUCCESS"}"#).unwrap();
        assert_eq!(
            event,
            TaskEvent::Success {
                result: serde_json::Value::Null
            }
        );
    }

    #[test]
    fn test_decode_failure() {
        let event = decode(r#"{"state": "FAILURE", "error": "CUDA out of memory"}"#).unwrap();
        assert_eq!(
            event,
            TaskEvent::Failure {
                error: "CUDA out of memory".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_state_is_an_error() {
        let err = decode(r#"{"state": "PAUSED"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownState(s) if s == "PAUSED"));
    }

    #[test]
    fn test_missing_or_mistyped_state_is_an_error() {
        assert!(matches!(
            decode(r#"{"details": {}}"#).unwrap_err(),
            DecodeError::MissingState
        ));
        assert!(matches!(
            decode(r#"{"state": 7}"#).unwrap_err(),
            DecodeError::MissingState
        ));
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(decode("not json at all").is_err());
        assert!(decode("").is_err());
    }
}
