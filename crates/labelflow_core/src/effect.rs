use std::time::Duration;

use crate::{CycleId, NoticeId, PollPolicy, SelectedFile, TaskId, Theme};

/// How long a notice stays fully visible.
pub const NOTICE_VISIBLE: Duration = Duration::from_millis(3000);
/// Length of the exit transition before a notice disappears.
pub const NOTICE_EXIT: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// POST the file and prompt to the processing service.
    SubmitUpload {
        cycle: CycleId,
        file: SelectedFile,
        prompt: String,
    },
    /// Start polling `task_id`. Replaces any poller that is still running.
    StartPolling {
        cycle: CycleId,
        task_id: TaskId,
        policy: PollPolicy,
    },
    StopPolling,
    Download {
        task_id: TaskId,
        fallback_name: String,
    },
    PersistTheme(Theme),
    /// Deliver `Msg::NoticeExpired` or `Msg::NoticeRemoved` for `id` after `after`.
    ScheduleNotice {
        id: NoticeId,
        step: NoticeStep,
        after: Duration,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeStep {
    Dismiss,
    Remove,
}
