use std::sync::mpsc;
use std::thread;

use flow_logging::{flow_debug, flow_info, flow_warn};
use labelflow_core::{Effect, Msg, NoticeStep, ProcessingStatus, StatusReport, TaskId};
use labelflow_engine::{
    EngineEvent, EngineEvents, EngineHandle, PollRequest, RemoteState, RemoteStatus, Upload,
};

use super::app::LoopEvent;
use super::persistence::ThemeStore;

/// Carries controller effects out to the engine, the theme store and timers.
pub struct EffectRunner {
    engine: EngineHandle,
    loop_tx: mpsc::Sender<LoopEvent>,
    themes: ThemeStore,
}

impl EffectRunner {
    pub fn new(
        engine: EngineHandle,
        events: EngineEvents,
        loop_tx: mpsc::Sender<LoopEvent>,
        themes: ThemeStore,
    ) -> Self {
        spawn_event_forwarder(events, loop_tx.clone());
        Self {
            engine,
            loop_tx,
            themes,
        }
    }

    pub fn sender(&self) -> mpsc::Sender<LoopEvent> {
        self.loop_tx.clone()
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitUpload {
                    cycle,
                    file,
                    prompt,
                } => {
                    flow_info!(
                        "SubmitUpload cycle={} file={} size={} prompt={:?}",
                        cycle,
                        file.name,
                        file.size,
                        prompt
                    );
                    let upload = Upload {
                        path: file.path,
                        file_name: file.name,
                        mime: file.mime,
                    };
                    self.engine.submit(cycle, upload, prompt);
                }
                Effect::StartPolling {
                    cycle,
                    task_id,
                    policy,
                } => {
                    flow_info!("StartPolling cycle={} task_id={}", cycle, task_id);
                    self.engine.start_polling(PollRequest {
                        cycle,
                        task_id: task_id.as_str().to_string(),
                        interval: policy.interval,
                        max_duration: policy.max_duration,
                    });
                }
                Effect::StopPolling => self.engine.stop_polling(),
                Effect::Download {
                    task_id,
                    fallback_name,
                } => {
                    flow_info!("Download task_id={} fallback={}", task_id, fallback_name);
                    self.engine.download(task_id.as_str(), fallback_name);
                }
                Effect::PersistTheme(theme) => self.themes.save_logged(theme),
                Effect::ScheduleNotice { id, step, after } => {
                    let msg = match step {
                        NoticeStep::Dismiss => Msg::NoticeExpired { id },
                        NoticeStep::Remove => Msg::NoticeRemoved { id },
                    };
                    let tx = self.loop_tx.clone();
                    thread::spawn(move || {
                        thread::sleep(after);
                        let _ = tx.send(LoopEvent::Msg(msg));
                    });
                }
            }
        }
    }
}

fn spawn_event_forwarder(events: EngineEvents, loop_tx: mpsc::Sender<LoopEvent>) {
    thread::spawn(move || {
        while let Some(event) = events.recv() {
            if loop_tx.send(LoopEvent::Msg(map_event(event))).is_err() {
                break;
            }
        }
        flow_debug!("Engine event stream closed");
    });
}

pub fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Submitted { cycle, result } => Msg::UploadFinished {
            cycle,
            // Failures are already logged by the engine.
            result: result.map(TaskId::new).map_err(|err| err.to_string()),
        },
        EngineEvent::Status { cycle, status } => Msg::StatusReported {
            cycle,
            report: map_status(status),
        },
        EngineEvent::PollFailed { cycle, error } => {
            flow_warn!("Status poll for cycle {} failed: {}", cycle, error);
            Msg::PollFailed {
                cycle,
                reason: error.to_string(),
            }
        }
        EngineEvent::PollDeadlineExceeded { cycle } => {
            flow_warn!("Polling for cycle {} hit its deadline", cycle);
            Msg::PollDeadlineExceeded { cycle }
        }
        EngineEvent::Downloaded { task_id, result } => Msg::DownloadFinished {
            task_id: TaskId::new(task_id),
            result: result.map_err(|err| err.to_string()),
        },
    }
}

fn map_status(status: RemoteStatus) -> StatusReport {
    StatusReport {
        status: match status.state {
            RemoteState::Processing => ProcessingStatus::Processing,
            RemoteState::Completed => ProcessingStatus::Completed,
            RemoteState::Error => ProcessingStatus::Error,
        },
        progress: status.progress,
        message: status.message,
    }
}
