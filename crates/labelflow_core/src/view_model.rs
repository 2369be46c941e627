use crate::{NoticeKind, Phase, Theme};

pub const SUBMIT_LABEL_IDLE: &str = "Process File";
pub const SUBMIT_LABEL_BUSY: &str = "Processing...";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub phase: Phase,
    pub file_name: Option<String>,
    pub file_size: Option<u64>,
    pub prompt_input: String,
    /// Prompt actually sent with the current cycle.
    pub used_prompt: Option<String>,
    pub progress: u8,
    pub progress_visible: bool,
    pub submit_enabled: bool,
    pub submit_label: &'static str,
    pub task_id: Option<String>,
    pub can_download: bool,
    pub theme: Theme,
    pub notice: Option<NoticeView>,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeView {
    pub kind: NoticeKind,
    pub message: String,
    pub leaving: bool,
}
