//! JSON bodies exchanged with the processing service.

use serde::Deserialize;

use crate::{ClientError, FailureKind, RemoteState, RemoteStatus};

#[derive(Debug, Deserialize)]
struct SubmitBody {
    task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusBody {
    status: String,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    message: Option<String>,
}

/// FastAPI-style error payload: `{"detail": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

pub(crate) fn parse_submit(body: &[u8]) -> Result<String, ClientError> {
    let parsed: SubmitBody = serde_json::from_slice(body)
        .map_err(|err| ClientError::new(FailureKind::InvalidResponse, err.to_string()))?;
    match parsed.task_id {
        Some(task_id) if !task_id.trim().is_empty() => Ok(task_id),
        _ => Err(ClientError::new(
            FailureKind::InvalidResponse,
            "response carries no task_id",
        )),
    }
}

pub(crate) fn parse_status(body: &[u8]) -> Result<RemoteStatus, ClientError> {
    let parsed: StatusBody = serde_json::from_slice(body)
        .map_err(|err| ClientError::new(FailureKind::InvalidResponse, err.to_string()))?;
    let state = match parsed.status.as_str() {
        "processing" => RemoteState::Processing,
        "completed" => RemoteState::Completed,
        "error" => RemoteState::Error,
        other => {
            return Err(ClientError::new(
                FailureKind::InvalidResponse,
                format!("unknown status {other:?}"),
            ))
        }
    };
    Ok(RemoteStatus {
        state,
        progress: parsed.progress.and_then(percent),
        message: parsed.message,
    })
}

/// Best-effort extraction of a server error message.
pub(crate) fn error_detail(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(text) => Some(text),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn percent(raw: f64) -> Option<u8> {
    if raw.is_finite() {
        Some(raw.clamp(0.0, 100.0).round() as u8)
    } else {
        None
    }
}
