use labelflow_core::{AppViewModel, NoticeKind, Phase, Theme};

use super::constants::{BAR_WIDTH, HELP_TEXT};

/// ANSI styling for one theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    base: &'static str,
    accent: &'static str,
    success: &'static str,
    error: &'static str,
    reset: &'static str,
}

impl Palette {
    pub fn for_theme(theme: Theme, color: bool) -> Self {
        if !color {
            return Self::plain();
        }
        match theme {
            Theme::Light => Self {
                base: "\x1b[30;107m",
                accent: "\x1b[34;107m",
                success: "\x1b[32;107m",
                error: "\x1b[31;107m",
                reset: "\x1b[0m",
            },
            Theme::Dark => Self {
                base: "\x1b[97;40m",
                accent: "\x1b[96;40m",
                success: "\x1b[92;40m",
                error: "\x1b[91;40m",
                reset: "\x1b[0m",
            },
        }
    }

    pub fn plain() -> Self {
        Self {
            base: "",
            accent: "",
            success: "",
            error: "",
            reset: "",
        }
    }

    fn paint(&self, style: &str, text: &str) -> String {
        format!("{style}{text}{}", self.reset)
    }
}

pub fn render(view: &AppViewModel, color: bool) -> Vec<String> {
    let palette = Palette::for_theme(view.theme, color);
    let mut lines = Vec::new();

    let theme_label = if view.theme.is_dark() { "dark" } else { "light" };
    lines.push(palette.paint(
        palette.accent,
        &format!("== LabelFlow ({}) [{} mode] ==", phase_label(view.phase), theme_label),
    ));

    match (&view.file_name, view.file_size) {
        (Some(name), Some(size)) => lines.push(palette.paint(
            palette.base,
            &format!("File:   {name} ({})", format_size(size)),
        )),
        (Some(name), None) => lines.push(palette.paint(palette.base, &format!("File:   {name}"))),
        _ => lines.push(palette.paint(
            palette.base,
            "File:   (none) - use 'select <path>' or 'drop <path>'",
        )),
    }

    let prompt = if view.prompt_input.trim().is_empty() {
        "(default)".to_string()
    } else {
        view.prompt_input.trim().to_string()
    };
    lines.push(palette.paint(palette.base, &format!("Prompt: {prompt}")));

    if let Some(used) = &view.used_prompt {
        lines.push(palette.paint(palette.base, &format!("Used prompt: {used}")));
    }

    if view.progress_visible {
        lines.push(palette.paint(palette.accent, &progress_bar(view.progress)));
    }

    if let Some(task_id) = &view.task_id {
        lines.push(palette.paint(palette.base, &format!("Task:   {task_id}")));
    }

    lines.push(palette.paint(palette.base, &actions_line(view)));

    if let Some(notice) = &view.notice {
        if !notice.leaving {
            let (style, marker) = match notice.kind {
                NoticeKind::Success => (palette.success, "[ok]"),
                NoticeKind::Error => (palette.error, "[!!]"),
            };
            lines.push(palette.paint(style, &format!("{marker} {}", notice.message)));
        }
    }

    lines
}

pub fn help_lines() -> Vec<String> {
    HELP_TEXT.lines().map(str::to_string).collect()
}

fn actions_line(view: &AppViewModel) -> String {
    let submit = if view.submit_enabled {
        format!("submit ({})", view.submit_label)
    } else {
        format!("[{}]", view.submit_label)
    };
    let actions: Vec<String> = match view.phase {
        Phase::Idle => vec!["select".into(), "drop".into()],
        Phase::FileSelected => vec![submit, "remove".into(), "prompt".into()],
        Phase::Uploading | Phase::Polling => vec![submit, "reset".into()],
        Phase::Completed => vec!["download".into(), "reset".into()],
        Phase::Error => vec!["retry".into(), "reset".into()],
    };
    format!("Next:   {} | theme | help | quit", actions.join(" | "))
}

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Idle => "idle",
        Phase::FileSelected => "file selected",
        Phase::Uploading => "uploading",
        Phase::Polling => "processing",
        Phase::Completed => "completed",
        Phase::Error => "error",
    }
}

fn progress_bar(progress: u8) -> String {
    let progress = usize::from(progress.min(100));
    let filled = progress * BAR_WIDTH / 100;
    format!(
        "[{}{}] {progress}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled)
    )
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
