use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::view_model::{AppViewModel, NoticeView, SUBMIT_LABEL_BUSY, SUBMIT_LABEL_IDLE};

/// MIME type accepted as an archive.
pub const ARCHIVE_MIME: &str = "application/zip";
/// Filename suffix accepted as an archive (case-sensitive).
pub const ARCHIVE_SUFFIX: &str = ".zip";
/// Prompt sent when the user leaves the prompt blank.
pub const DEFAULT_PROMPT: &str = "Find all objects";

pub type CycleId = u64;
pub type NoticeId = u64;

/// A file picked by the user, as described by the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    /// Declared MIME type; `None` when the front end could not tell.
    pub mime: Option<String>,
    pub size: u64,
    pub path: PathBuf,
}

impl SelectedFile {
    pub fn is_archive(&self) -> bool {
        self.mime.as_deref() == Some(ARCHIVE_MIME) || self.name.ends_with(ARCHIVE_SUFFIX)
    }
}

/// Opaque identifier issued by the processing service for one upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    FileSelected,
    Uploading,
    Polling,
    Completed,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStatus {
    Processing,
    Completed,
    Error,
}

/// One answer from the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub status: ProcessingStatus,
    /// Percentage in `0..=100`.
    pub progress: Option<u8>,
    pub message: Option<String>,
}

impl StatusReport {
    pub fn processing(progress: Option<u8>) -> Self {
        Self {
            status: ProcessingStatus::Processing,
            progress,
            message: None,
        }
    }

    pub fn completed() -> Self {
        Self {
            status: ProcessingStatus::Completed,
            progress: None,
            message: None,
        }
    }

    pub fn error(message: Option<String>) -> Self {
        Self {
            status: ProcessingStatus::Error,
            progress: None,
            message,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        self == Theme::Dark
    }

    /// Value stored under the `darkMode` preference key.
    pub fn storage_value(self) -> &'static str {
        match self {
            Theme::Dark => "enabled",
            Theme::Light => "disabled",
        }
    }

    /// Anything other than `"enabled"` reads back as light.
    pub fn from_storage_value(raw: &str) -> Self {
        if raw == "enabled" {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticePhase {
    Visible,
    Leaving,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub id: NoticeId,
    pub kind: NoticeKind,
    pub message: String,
    pub phase: NoticePhase,
}

/// Limits applied to the status polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    /// Give up once a cycle has been polling this long. `None` polls forever.
    pub max_duration: Option<Duration>,
    /// Give up after this many failed polls in a row. `None` never gives up.
    pub max_consecutive_failures: Option<u32>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            max_duration: Some(Duration::from_secs(30 * 60)),
            max_consecutive_failures: None,
        }
    }
}

/// Trims the prompt and substitutes [`DEFAULT_PROMPT`] when nothing is left.
pub fn effective_prompt(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        DEFAULT_PROMPT.to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    phase: Phase,
    selected_file: Option<SelectedFile>,
    prompt_input: String,
    used_prompt: Option<String>,
    task_id: Option<TaskId>,
    progress: u8,
    cycle: CycleId,
    consecutive_poll_failures: u32,
    poll_policy: PollPolicy,
    theme: Theme,
    notice: Option<Notice>,
    next_notice_id: NoticeId,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_policy(poll_policy: PollPolicy) -> Self {
        Self {
            poll_policy,
            ..Self::default()
        }
    }

    pub fn view(&self) -> AppViewModel {
        let busy = matches!(self.phase, Phase::Uploading | Phase::Polling);
        AppViewModel {
            phase: self.phase,
            file_name: self.selected_file.as_ref().map(|f| f.name.clone()),
            file_size: self.selected_file.as_ref().map(|f| f.size),
            prompt_input: self.prompt_input.clone(),
            used_prompt: self.used_prompt.clone(),
            progress: self.progress,
            progress_visible: matches!(
                self.phase,
                Phase::Uploading | Phase::Polling | Phase::Completed
            ),
            submit_enabled: self.phase == Phase::FileSelected,
            submit_label: if busy {
                SUBMIT_LABEL_BUSY
            } else {
                SUBMIT_LABEL_IDLE
            },
            task_id: self.task_id.as_ref().map(|t| t.to_string()),
            can_download: self.phase == Phase::Completed && self.task_id.is_some(),
            theme: self.theme,
            notice: self.notice.as_ref().map(|n| NoticeView {
                kind: n.kind,
                message: n.message.clone(),
                leaving: n.phase == NoticePhase::Leaving,
            }),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.selected_file.as_ref()
    }

    pub fn task_id(&self) -> Option<&TaskId> {
        self.task_id.as_ref()
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn cycle(&self) -> CycleId {
        self.cycle
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn poll_policy(&self) -> PollPolicy {
        self.poll_policy
    }

    pub fn prompt_input(&self) -> &str {
        &self.prompt_input
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn select_file(&mut self, file: SelectedFile) {
        self.selected_file = Some(file);
        self.phase = Phase::FileSelected;
        self.mark_dirty();
    }

    pub(crate) fn remove_file(&mut self) {
        self.selected_file = None;
        self.phase = Phase::Idle;
        self.mark_dirty();
    }

    pub(crate) fn set_prompt_input(&mut self, text: String) {
        if self.prompt_input != text {
            self.prompt_input = text;
            self.mark_dirty();
        }
    }

    /// Opens a new upload cycle and returns its id.
    pub(crate) fn begin_cycle(&mut self, prompt: String) -> CycleId {
        self.cycle += 1;
        self.phase = Phase::Uploading;
        self.task_id = None;
        self.progress = 0;
        self.consecutive_poll_failures = 0;
        self.used_prompt = Some(prompt);
        self.mark_dirty();
        self.cycle
    }

    pub(crate) fn is_current(&self, cycle: CycleId, phase: Phase) -> bool {
        self.cycle == cycle && self.phase == phase
    }

    pub(crate) fn start_polling(&mut self, task_id: TaskId) {
        self.task_id = Some(task_id);
        self.phase = Phase::Polling;
        self.mark_dirty();
    }

    pub(crate) fn set_progress(&mut self, progress: u8) {
        let progress = progress.min(100);
        if self.progress != progress {
            self.progress = progress;
            self.mark_dirty();
        }
    }

    pub(crate) fn complete(&mut self) {
        self.progress = 100;
        self.phase = Phase::Completed;
        self.mark_dirty();
    }

    pub(crate) fn fail(&mut self) {
        self.phase = Phase::Error;
        self.mark_dirty();
    }

    pub(crate) fn record_poll_success(&mut self) {
        self.consecutive_poll_failures = 0;
    }

    /// Counts a failed poll and returns the running total.
    pub(crate) fn record_poll_failure(&mut self) -> u32 {
        self.consecutive_poll_failures = self.consecutive_poll_failures.saturating_add(1);
        self.consecutive_poll_failures
    }

    pub(crate) fn reset(&mut self) {
        self.phase = Phase::Idle;
        self.selected_file = None;
        self.task_id = None;
        self.used_prompt = None;
        self.progress = 0;
        self.consecutive_poll_failures = 0;
        self.mark_dirty();
    }

    pub(crate) fn set_theme(&mut self, theme: Theme) {
        if self.theme != theme {
            self.theme = theme;
            self.mark_dirty();
        }
    }

    pub(crate) fn show_notice(&mut self, kind: NoticeKind, message: String) -> NoticeId {
        self.next_notice_id += 1;
        let id = self.next_notice_id;
        self.notice = Some(Notice {
            id,
            kind,
            message,
            phase: NoticePhase::Visible,
        });
        self.mark_dirty();
        id
    }

    /// Moves the notice to its exit transition if `id` is still the one shown.
    pub(crate) fn begin_notice_exit(&mut self, id: NoticeId) -> bool {
        match self.notice.as_mut() {
            Some(notice) if notice.id == id && notice.phase == NoticePhase::Visible => {
                notice.phase = NoticePhase::Leaving;
                self.dirty = true;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn remove_notice(&mut self, id: NoticeId) {
        if self.notice.as_ref().is_some_and(|n| n.id == id) {
            self.notice = None;
            self.mark_dirty();
        }
    }
}
