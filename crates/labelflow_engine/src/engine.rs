use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;

use flow_logging::{flow_info, flow_warn};
use thiserror::Error;

use crate::client::{ClientSettings, ProcessingClient, ReqwestProcessingClient};
use crate::filename::safe_file_name;
use crate::persist::{AtomicFileWriter, Collision};
use crate::poller::{ChannelEventSink, EventSink, PollRequest, Poller};
use crate::{ClientError, CycleId, EngineEvent, FailureKind, Upload};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub client: ClientSettings,
    /// Where downloaded archives are saved.
    pub output_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("could not build http client: {0}")]
    Client(#[from] ClientError),
    #[error("could not start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

enum EngineCommand {
    Submit {
        cycle: CycleId,
        upload: Upload,
        prompt: String,
    },
    StartPolling(PollRequest),
    StopPolling,
    Download {
        task_id: String,
        fallback_name: String,
    },
}

/// Sending half of the engine: queue work from the UI thread.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

/// Receiving half of the engine: results of queued work.
pub struct EngineEvents {
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<(Self, EngineEvents), EngineError> {
        let client = ReqwestProcessingClient::new(config.client)?;
        Self::with_client(Arc::new(client), config.output_dir)
    }

    /// Runs the engine against any [`ProcessingClient`].
    pub fn with_client(
        client: Arc<dyn ProcessingClient>,
        output_dir: PathBuf,
    ) -> Result<(Self, EngineEvents), EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Runtime::new()?;
        let sink: Arc<dyn EventSink> = Arc::new(ChannelEventSink::new(event_tx));
        let writer = Arc::new(AtomicFileWriter::new(output_dir));

        thread::spawn(move || {
            let mut poller = Poller::new();
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::StartPolling(request) => {
                        poller.start(runtime.handle(), client.clone(), request, sink.clone());
                    }
                    EngineCommand::StopPolling => poller.stop(),
                    other => {
                        let client = client.clone();
                        let sink = sink.clone();
                        let writer = writer.clone();
                        runtime.spawn(async move {
                            handle_command(client.as_ref(), writer.as_ref(), other, sink.as_ref())
                                .await;
                        });
                    }
                }
            }
            poller.stop();
        });

        Ok((Self { cmd_tx }, EngineEvents { event_rx }))
    }

    pub fn submit(&self, cycle: CycleId, upload: Upload, prompt: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Submit {
            cycle,
            upload,
            prompt: prompt.into(),
        });
    }

    pub fn start_polling(&self, request: PollRequest) {
        let _ = self.cmd_tx.send(EngineCommand::StartPolling(request));
    }

    pub fn stop_polling(&self) {
        let _ = self.cmd_tx.send(EngineCommand::StopPolling);
    }

    pub fn download(&self, task_id: impl Into<String>, fallback_name: impl Into<String>) {
        let _ = self.cmd_tx.send(EngineCommand::Download {
            task_id: task_id.into(),
            fallback_name: fallback_name.into(),
        });
    }
}

impl EngineEvents {
    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Blocks until an event arrives; `None` once the engine has shut down.
    pub fn recv(&self) -> Option<EngineEvent> {
        self.event_rx.recv().ok()
    }
}

async fn handle_command(
    client: &dyn ProcessingClient,
    writer: &AtomicFileWriter,
    command: EngineCommand,
    sink: &dyn EventSink,
) {
    match command {
        EngineCommand::Submit {
            cycle,
            upload,
            prompt,
        } => {
            flow_info!(
                "Submitting {} ({} chars of prompt, cycle {})",
                upload.file_name,
                prompt.len(),
                cycle
            );
            let result = client.submit(&upload, &prompt).await;
            if let Err(err) = &result {
                flow_warn!("Submission for cycle {} failed: {}", cycle, err);
            }
            sink.emit(EngineEvent::Submitted { cycle, result });
        }
        EngineCommand::Download {
            task_id,
            fallback_name,
        } => {
            let result = match client.download(&task_id).await {
                Ok(archive) => {
                    let name = safe_file_name(archive.suggested_name.as_deref(), &fallback_name);
                    writer
                        .write(&name, &archive.bytes, Collision::KeepBoth)
                        .map_err(|err| ClientError::new(FailureKind::Io, err.to_string()))
                }
                Err(err) => Err(err),
            };
            match &result {
                Ok(path) => flow_info!("Saved result of task {} to {:?}", task_id, path),
                Err(err) => flow_warn!("Download of task {} failed: {}", task_id, err),
            }
            sink.emit(EngineEvent::Downloaded { task_id, result });
        }
        EngineCommand::StartPolling(_) | EngineCommand::StopPolling => {}
    }
}
