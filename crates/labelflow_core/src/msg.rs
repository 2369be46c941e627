use std::path::PathBuf;

use crate::{CycleId, NoticeId, SelectedFile, StatusReport, TaskId, Theme};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked or dropped files; only the first one is considered.
    FilesChosen(Vec<SelectedFile>),
    /// User removed the selected file.
    FileRemoved,
    /// User edited the prompt box.
    PromptChanged(String),
    /// User clicked "Process File".
    SubmitClicked,
    /// User asked to resubmit the same file after an error.
    RetryClicked,
    /// Submission round-trip finished.
    UploadFinished {
        cycle: CycleId,
        result: Result<TaskId, String>,
    },
    /// A status poll returned a report.
    StatusReported {
        cycle: CycleId,
        report: StatusReport,
    },
    /// A status poll failed in transport or returned garbage.
    PollFailed { cycle: CycleId, reason: String },
    /// The poller hit its maximum duration.
    PollDeadlineExceeded { cycle: CycleId },
    /// User clicked Download.
    DownloadClicked,
    /// Download finished, with the saved path on success.
    DownloadFinished {
        task_id: TaskId,
        result: Result<PathBuf, String>,
    },
    /// User asked for a fresh upload.
    ResetClicked,
    /// User flipped the theme.
    ThemeToggled,
    /// Theme loaded from storage at startup.
    ThemeRestored(Theme),
    /// Notice display time elapsed.
    NoticeExpired { id: NoticeId },
    /// Notice exit transition elapsed.
    NoticeRemoved { id: NoticeId },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
