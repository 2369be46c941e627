use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Upload cycle the engine is working for; echoed back on every event.
pub type CycleId = u64;

/// A local archive to send to the processing service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub path: PathBuf,
    pub file_name: String,
    pub mime: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteState {
    Processing,
    Completed,
    Error,
}

/// Decoded body of `GET /status/{task_id}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteStatus {
    pub state: RemoteState,
    pub progress: Option<u8>,
    pub message: Option<String>,
}

impl RemoteStatus {
    pub fn is_terminal(&self) -> bool {
        self.state != RemoteState::Processing
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedArchive {
    /// Filename offered by the server, if any.
    pub suggested_name: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Submitted {
        cycle: CycleId,
        result: Result<String, ClientError>,
    },
    Status {
        cycle: CycleId,
        status: RemoteStatus,
    },
    PollFailed {
        cycle: CycleId,
        error: ClientError,
    },
    PollDeadlineExceeded {
        cycle: CycleId,
    },
    Downloaded {
        task_id: String,
        result: Result<PathBuf, ClientError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct ClientError {
    pub kind: FailureKind,
    pub message: String,
}

impl ClientError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    Io,
    HttpStatus(u16),
    Timeout,
    Network,
    InvalidResponse,
    TooLarge { max_bytes: u64, actual: Option<u64> },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::Io => write!(f, "io error"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
        }
    }
}
