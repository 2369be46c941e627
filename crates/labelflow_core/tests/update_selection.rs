use std::path::PathBuf;
use std::sync::Once;

use labelflow_core::{
    update, AppState, Effect, Msg, NoticeKind, Phase, SelectedFile, DEFAULT_PROMPT,
    SUBMIT_LABEL_BUSY, SUBMIT_LABEL_IDLE,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(flow_logging::initialize_for_tests);
}

fn file(name: &str, mime: Option<&str>) -> SelectedFile {
    SelectedFile {
        name: name.to_string(),
        mime: mime.map(str::to_string),
        size: 42,
        path: PathBuf::from("/tmp").join(name),
    }
}

fn select(state: AppState, selected: SelectedFile) -> AppState {
    update(state, Msg::FilesChosen(vec![selected])).0
}

#[test]
fn non_archive_is_rejected_and_stays_idle() {
    init_logging();
    let candidates = [
        file("photos.tar", Some("application/x-tar")),
        file("photos.ZIP", None),
        file("photos.zip.bak", Some("application/octet-stream")),
        file("notes.txt", Some("text/plain")),
    ];

    for candidate in candidates {
        let (next, effects) = update(AppState::new(), Msg::FilesChosen(vec![candidate]));
        assert_eq!(next.phase(), Phase::Idle);
        assert!(next.selected_file().is_none());
        assert_eq!(effects.len(), 1);
        let notice = next.notice().expect("rejection notice");
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.message, "Please select a ZIP file");
    }
}

#[test]
fn archive_accepted_by_suffix_or_mime() {
    init_logging();
    let by_suffix = select(AppState::new(), file("images.zip", None));
    assert_eq!(by_suffix.phase(), Phase::FileSelected);

    let by_mime = select(AppState::new(), file("images", Some("application/zip")));
    assert_eq!(by_mime.phase(), Phase::FileSelected);
    assert_eq!(by_mime.view().file_name.as_deref(), Some("images"));
    assert_eq!(by_mime.view().submit_label, SUBMIT_LABEL_IDLE);
    assert!(by_mime.view().submit_enabled);
}

#[test]
fn only_first_of_many_files_is_considered() {
    init_logging();
    let (next, _) = update(
        AppState::new(),
        Msg::FilesChosen(vec![file("notes.txt", None), file("images.zip", None)]),
    );
    assert_eq!(next.phase(), Phase::Idle);

    let (next, effects) = update(AppState::new(), Msg::FilesChosen(Vec::new()));
    assert_eq!(next, AppState::new());
    assert!(effects.is_empty());
}

#[test]
fn remove_returns_to_idle() {
    init_logging();
    let mut state = select(AppState::new(), file("a.zip", None));
    assert!(state.consume_dirty());

    let (mut state, effects) = update(state, Msg::FileRemoved);
    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Idle);
    assert!(state.selected_file().is_none());
    assert!(state.consume_dirty());
}

#[test]
fn submit_without_file_shows_notice() {
    init_logging();
    let (state, effects) = update(AppState::new(), Msg::SubmitClicked);
    assert_eq!(state.phase(), Phase::Idle);
    assert_eq!(effects.len(), 1);
    assert_eq!(
        state.notice().map(|n| n.message.as_str()),
        Some("Please select a file first")
    );
}

#[test]
fn empty_prompt_is_replaced_by_default() {
    init_logging();
    let state = select(AppState::new(), file("a.zip", None));
    let (state, _) = update(state, Msg::PromptChanged("   ".to_string()));
    let (state, effects) = update(state, Msg::SubmitClicked);

    assert_eq!(state.phase(), Phase::Uploading);
    assert_eq!(
        effects,
        vec![Effect::SubmitUpload {
            cycle: 1,
            file: file("a.zip", None),
            prompt: DEFAULT_PROMPT.to_string(),
        }]
    );
    let view = state.view();
    assert_eq!(view.used_prompt.as_deref(), Some(DEFAULT_PROMPT));
    assert!(view.progress_visible);
    assert_eq!(view.progress, 0);
    assert!(!view.submit_enabled);
    assert_eq!(view.submit_label, SUBMIT_LABEL_BUSY);
}

#[test]
fn prompt_is_trimmed_before_sending() {
    init_logging();
    let state = select(AppState::new(), file("a.zip", None));
    let (state, _) = update(state, Msg::PromptChanged("  find cats \n".to_string()));
    let (state, effects) = update(state, Msg::SubmitClicked);

    match &effects[..] {
        [Effect::SubmitUpload { prompt, .. }] => assert_eq!(prompt, "find cats"),
        other => panic!("unexpected effects {other:?}"),
    }
    assert_eq!(state.view().used_prompt.as_deref(), Some("find cats"));
    assert_eq!(state.view().prompt_input, "  find cats \n");
}

#[test]
fn selection_ignored_while_busy() {
    init_logging();
    let state = select(AppState::new(), file("a.zip", None));
    let (state, _) = update(state, Msg::SubmitClicked);
    let (state, effects) = update(state, Msg::FilesChosen(vec![file("b.zip", None)]));

    assert!(effects.is_empty());
    assert_eq!(state.phase(), Phase::Uploading);
    assert_eq!(state.selected_file().map(|f| f.name.as_str()), Some("a.zip"));

    let (state, effects) = update(state, Msg::SubmitClicked);
    assert!(effects.is_empty());
    assert_eq!(state.cycle(), 1);
}
