use crate::{
    effective_prompt, AppState, Effect, Msg, NoticeKind, NoticeStep, Phase, ProcessingStatus,
    SelectedFile, StatusReport, NOTICE_EXIT, NOTICE_VISIBLE,
};

const MSG_NOT_ARCHIVE: &str = "Please select a ZIP file";
const MSG_NO_FILE: &str = "Please select a file first";
const MSG_SUBMIT_FAILED: &str = "An error occurred during processing";
const MSG_PROCESSED: &str = "File processed successfully!";
const MSG_PROCESSING_FAILED: &str = "Processing failed";
const MSG_LOST_CONTACT: &str = "Lost contact with the processing service";
const MSG_TOO_LONG: &str = "Processing is taking too long";
const MSG_NOTHING_TO_DOWNLOAD: &str = "Nothing to download yet";
const MSG_DOWNLOAD_FAILED: &str = "Download failed";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FilesChosen(files) => choose_file(&mut state, files),
        Msg::FileRemoved => {
            if state.phase() == Phase::FileSelected {
                state.remove_file();
            }
            Vec::new()
        }
        Msg::PromptChanged(text) => {
            state.set_prompt_input(text);
            Vec::new()
        }
        Msg::SubmitClicked => match state.phase() {
            Phase::FileSelected => begin_upload(&mut state),
            Phase::Idle => vec![notify(&mut state, NoticeKind::Error, MSG_NO_FILE)],
            _ => Vec::new(),
        },
        Msg::RetryClicked => {
            if state.phase() == Phase::Error && state.selected_file().is_some() {
                begin_upload(&mut state)
            } else {
                Vec::new()
            }
        }
        Msg::UploadFinished { cycle, result } => {
            if !state.is_current(cycle, Phase::Uploading) {
                return (state, Vec::new());
            }
            match result {
                Ok(task_id) => {
                    state.start_polling(task_id.clone());
                    vec![Effect::StartPolling {
                        cycle,
                        task_id,
                        policy: state.poll_policy(),
                    }]
                }
                Err(_) => {
                    state.fail();
                    vec![notify(&mut state, NoticeKind::Error, MSG_SUBMIT_FAILED)]
                }
            }
        }
        Msg::StatusReported { cycle, report } => {
            if !state.is_current(cycle, Phase::Polling) {
                return (state, Vec::new());
            }
            state.record_poll_success();
            apply_status(&mut state, report)
        }
        Msg::PollFailed { cycle, .. } => {
            if !state.is_current(cycle, Phase::Polling) {
                return (state, Vec::new());
            }
            let failures = state.record_poll_failure();
            match state.poll_policy().max_consecutive_failures {
                Some(max) if failures >= max => stop_with_error(&mut state, MSG_LOST_CONTACT),
                _ => Vec::new(),
            }
        }
        Msg::PollDeadlineExceeded { cycle } => {
            if !state.is_current(cycle, Phase::Polling) {
                return (state, Vec::new());
            }
            stop_with_error(&mut state, MSG_TOO_LONG)
        }
        Msg::DownloadClicked => match (state.phase(), state.task_id().cloned()) {
            (Phase::Completed, Some(task_id)) => {
                let fallback_name = state
                    .selected_file()
                    .map(|file| format!("processed_{}", file.name))
                    .unwrap_or_else(|| format!("processed_{task_id}.zip"));
                vec![Effect::Download {
                    task_id,
                    fallback_name,
                }]
            }
            _ => vec![notify(&mut state, NoticeKind::Error, MSG_NOTHING_TO_DOWNLOAD)],
        },
        Msg::DownloadFinished { result, .. } => match result {
            Ok(path) => {
                let message = format!("Saved {}", path.display());
                vec![notify(&mut state, NoticeKind::Success, &message)]
            }
            Err(_) => vec![notify(&mut state, NoticeKind::Error, MSG_DOWNLOAD_FAILED)],
        },
        Msg::ResetClicked => {
            if state.phase() == Phase::Idle && state.selected_file().is_none() {
                Vec::new()
            } else {
                state.reset();
                vec![Effect::StopPolling]
            }
        }
        Msg::ThemeToggled => {
            let theme = state.theme().toggled();
            state.set_theme(theme);
            let message = if theme.is_dark() {
                "Dark mode enabled"
            } else {
                "Light mode enabled"
            };
            vec![
                Effect::PersistTheme(theme),
                notify(&mut state, NoticeKind::Success, message),
            ]
        }
        Msg::ThemeRestored(theme) => {
            state.set_theme(theme);
            Vec::new()
        }
        Msg::NoticeExpired { id } => {
            if state.begin_notice_exit(id) {
                vec![Effect::ScheduleNotice {
                    id,
                    step: NoticeStep::Remove,
                    after: NOTICE_EXIT,
                }]
            } else {
                Vec::new()
            }
        }
        Msg::NoticeRemoved { id } => {
            state.remove_notice(id);
            Vec::new()
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn choose_file(state: &mut AppState, files: Vec<SelectedFile>) -> Vec<Effect> {
    let Some(file) = files.into_iter().next() else {
        return Vec::new();
    };
    // A new file cannot replace one that is already being processed.
    if !matches!(state.phase(), Phase::Idle | Phase::FileSelected) {
        return Vec::new();
    }
    if !file.is_archive() {
        return vec![notify(state, NoticeKind::Error, MSG_NOT_ARCHIVE)];
    }
    state.select_file(file);
    Vec::new()
}

fn begin_upload(state: &mut AppState) -> Vec<Effect> {
    let Some(file) = state.selected_file().cloned() else {
        return vec![notify(state, NoticeKind::Error, MSG_NO_FILE)];
    };
    let prompt = effective_prompt(state.prompt_input());
    let cycle = state.begin_cycle(prompt.clone());
    vec![Effect::SubmitUpload {
        cycle,
        file,
        prompt,
    }]
}

fn apply_status(state: &mut AppState, report: StatusReport) -> Vec<Effect> {
    match report.status {
        ProcessingStatus::Processing => {
            state.set_progress(report.progress.unwrap_or(0));
            Vec::new()
        }
        ProcessingStatus::Completed => {
            state.complete();
            vec![
                Effect::StopPolling,
                notify(state, NoticeKind::Success, MSG_PROCESSED),
            ]
        }
        ProcessingStatus::Error => {
            let message = report
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| MSG_PROCESSING_FAILED.to_string());
            stop_with_error(state, &message)
        }
    }
}

fn stop_with_error(state: &mut AppState, message: &str) -> Vec<Effect> {
    state.fail();
    vec![
        Effect::StopPolling,
        notify(state, NoticeKind::Error, message),
    ]
}

fn notify(state: &mut AppState, kind: NoticeKind, message: &str) -> Effect {
    let id = state.show_notice(kind, message.to_string());
    Effect::ScheduleNotice {
        id,
        step: NoticeStep::Dismiss,
        after: NOTICE_VISIBLE,
    }
}
