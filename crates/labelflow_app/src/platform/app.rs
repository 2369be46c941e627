use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

use anyhow::{anyhow, bail, Context, Result};
use flow_logging::{flow_debug, flow_info};
use labelflow_core::{update, AppState, AppViewModel, Msg, Phase};
use labelflow_engine::EngineHandle;

use super::config::AppConfig;
use super::effects::EffectRunner;
use super::input::{command_msg, inspect_file, parse_command, Command};
use super::persistence::ThemeStore;
use super::ui;

/// Everything the main loop reacts to.
#[derive(Debug)]
pub enum LoopEvent {
    Msg(Msg),
    /// Text for the user that does not touch state.
    Echo(String),
    Help,
    Show,
    Quit,
}

struct App {
    state: AppState,
    runner: EffectRunner,
    color: bool,
}

impl App {
    fn start(config: &AppConfig) -> Result<(Self, mpsc::Receiver<LoopEvent>)> {
        let (engine, events) =
            EngineHandle::new(config.engine_config()).context("starting engine")?;
        let (loop_tx, loop_rx) = mpsc::channel();
        let themes = ThemeStore::new(config.preferences_path());
        let runner = EffectRunner::new(engine, events, loop_tx, themes);
        let app = Self {
            state: AppState::with_poll_policy(config.poll_policy()),
            runner,
            color: config.color,
        };
        Ok((app, loop_rx))
    }

    /// Applies `msg` and runs its effects. Returns whether the view changed.
    fn dispatch(&mut self, msg: Msg) -> bool {
        flow_debug!("dispatch {:?}", msg);
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let was_dirty = state.consume_dirty();
        self.state = state;
        self.runner.enqueue(effects);
        was_dirty
    }

    fn view(&self) -> AppViewModel {
        self.state.view()
    }

    fn draw(&self) {
        print_lines(&ui::render::render(&self.view(), self.color));
    }
}

pub fn run_interactive(config: &AppConfig) -> Result<()> {
    let (mut app, loop_rx) = App::start(config)?;
    let theme = ThemeStore::new(config.preferences_path()).load();
    app.dispatch(Msg::ThemeRestored(theme));

    spawn_stdin_reader(app.runner.sender());
    app.draw();
    print_prompt();

    'session: while let Ok(first) = loop_rx.recv() {
        // Coalesce whatever else is already queued into one redraw.
        let mut redraw = false;
        for event in std::iter::once(first).chain(loop_rx.try_iter()) {
            match handle_event(&mut app, event) {
                Some(dirty) => redraw |= dirty,
                None => break 'session,
            }
        }
        if redraw {
            app.draw();
            print_prompt();
        }
    }

    flow_info!("Interactive session ended");
    Ok(())
}

/// `None` means quit; otherwise whether a redraw is due.
fn handle_event(app: &mut App, event: LoopEvent) -> Option<bool> {
    match event {
        LoopEvent::Msg(msg) => Some(app.dispatch(msg)),
        LoopEvent::Echo(text) => {
            println!("{text}");
            print_prompt();
            Some(false)
        }
        LoopEvent::Help => {
            print_lines(&ui::render::help_lines());
            print_prompt();
            Some(false)
        }
        LoopEvent::Show => Some(true),
        LoopEvent::Quit => None,
    }
}

fn spawn_stdin_reader(tx: mpsc::Sender<LoopEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if let Some(event) = line_event(&line) {
                let quit = matches!(event, LoopEvent::Quit);
                if tx.send(event).is_err() || quit {
                    return;
                }
            }
        }
        let _ = tx.send(LoopEvent::Quit);
    });
}

fn line_event(line: &str) -> Option<LoopEvent> {
    let command = match parse_command(line) {
        Ok(Some(command)) => command,
        Ok(None) => return None,
        Err(err) => return Some(LoopEvent::Echo(err)),
    };
    let event = match command {
        Command::Help => LoopEvent::Help,
        Command::Status => LoopEvent::Show,
        Command::Quit => LoopEvent::Quit,
        other => match command_msg(&other) {
            Some(Ok(msg)) => LoopEvent::Msg(msg),
            Some(Err(err)) => LoopEvent::Echo(err),
            None => return None,
        },
    };
    Some(event)
}

/// Uploads one archive, waits for processing and saves the result.
pub fn run_once(config: &AppConfig, file: &Path, prompt: &str) -> Result<PathBuf> {
    let (mut app, loop_rx) = App::start(config)?;

    let selected =
        inspect_file(file).with_context(|| format!("cannot read {}", file.display()))?;
    app.dispatch(Msg::FilesChosen(vec![selected]));
    if app.state.phase() != Phase::FileSelected {
        bail!("{}", notice_text(&app.view(), "file rejected"));
    }
    app.dispatch(Msg::PromptChanged(prompt.to_string()));
    app.dispatch(Msg::SubmitClicked);
    println!("Uploading {} ...", file.display());

    let mut last_progress = None;
    let mut download_requested = false;
    while let Ok(event) = loop_rx.recv() {
        let LoopEvent::Msg(msg) = event else { continue };
        let finished = match &msg {
            Msg::DownloadFinished { result, .. } => Some(result.clone()),
            _ => None,
        };
        app.dispatch(msg);
        let view = app.view();

        if let Some(result) = finished {
            return result.map_err(|err| anyhow!("download failed: {err}"));
        }
        match view.phase {
            Phase::Polling if last_progress != Some(view.progress) => {
                last_progress = Some(view.progress);
                println!("Processing... {}%", view.progress);
            }
            Phase::Completed if !download_requested => {
                download_requested = true;
                println!("Processing complete, downloading result");
                app.dispatch(Msg::DownloadClicked);
            }
            Phase::Error => bail!("{}", notice_text(&view, "processing failed")),
            _ => {}
        }
    }
    bail!("engine stopped before the result was saved")
}

/// Flips the stored theme preference without starting the engine.
pub fn toggle_theme(config: &AppConfig) -> Result<()> {
    let store = ThemeStore::new(config.preferences_path());
    let theme = store.load().toggled();
    let path = store
        .save(theme)
        .with_context(|| format!("saving preferences to {}", store.path().display()))?;
    let label = if theme.is_dark() { "Dark" } else { "Light" };
    println!("{label} mode enabled ({})", path.display());
    Ok(())
}

fn notice_text(view: &AppViewModel, fallback: &str) -> String {
    view.notice
        .as_ref()
        .map(|n| n.message.clone())
        .unwrap_or_else(|| fallback.to_string())
}

fn print_lines(lines: &[String]) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in lines {
        let _ = writeln!(out, "{line}");
    }
}

fn print_prompt() {
    let mut out = io::stdout();
    let _ = write!(out, "> ");
    let _ = out.flush();
}
