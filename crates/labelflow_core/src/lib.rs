//! LabelFlow core: pure upload/poll state machine and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::{Effect, NoticeStep, NOTICE_EXIT, NOTICE_VISIBLE};
pub use msg::Msg;
pub use state::{
    effective_prompt, AppState, CycleId, Notice, NoticeId, NoticeKind, NoticePhase, Phase,
    PollPolicy, ProcessingStatus, SelectedFile, StatusReport, TaskId, Theme, ARCHIVE_MIME,
    ARCHIVE_SUFFIX, DEFAULT_PROMPT,
};
pub use update::update;
pub use view_model::{AppViewModel, NoticeView, SUBMIT_LABEL_BUSY, SUBMIT_LABEL_IDLE};
