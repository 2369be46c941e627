use std::sync::Arc;
use std::time::Duration;

use flow_logging::{flow_debug, flow_info};
use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{CycleId, EngineEvent, ProcessingClient};

pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollRequest {
    pub cycle: CycleId,
    pub task_id: String,
    pub interval: Duration,
    pub max_duration: Option<Duration>,
}

/// Owns the single status-polling task.
///
/// At most one loop runs at a time: `start` cancels the previous loop before
/// spawning the next, and `stop` cancels whatever is running. A cancelled loop
/// drops any in-flight request and emits nothing further.
#[derive(Default)]
pub struct Poller {
    current: Option<(CycleId, CancellationToken)>,
}

impl Poller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(
        &mut self,
        runtime: &Handle,
        client: Arc<dyn ProcessingClient>,
        request: PollRequest,
        sink: Arc<dyn EventSink>,
    ) {
        self.stop();
        let token = CancellationToken::new();
        flow_info!(
            "Polling task {} every {:?} (cycle {})",
            request.task_id,
            request.interval,
            request.cycle
        );
        self.current = Some((request.cycle, token.clone()));
        runtime.spawn(poll_loop(client, request, sink, token));
    }

    pub fn stop(&mut self) {
        if let Some((cycle, token)) = self.current.take() {
            flow_debug!("Stopping poller for cycle {}", cycle);
            token.cancel();
        }
    }

    /// Cycle of the running loop, if any.
    pub fn active_cycle(&self) -> Option<CycleId> {
        self.current
            .as_ref()
            .filter(|(_, token)| !token.is_cancelled())
            .map(|(cycle, _)| *cycle)
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn poll_loop(
    client: Arc<dyn ProcessingClient>,
    request: PollRequest,
    sink: Arc<dyn EventSink>,
    token: CancellationToken,
) {
    let PollRequest {
        cycle,
        task_id,
        interval,
        max_duration,
    } = request;
    let started = Instant::now();
    // First status check happens one interval after submission, not immediately.
    let mut ticker = interval_at(started + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = ticker.tick() => {}
        }

        if let Some(max) = max_duration {
            if started.elapsed() >= max {
                sink.emit(EngineEvent::PollDeadlineExceeded { cycle });
                token.cancel();
                return;
            }
        }

        let result = tokio::select! {
            _ = token.cancelled() => return,
            result = client.status(&task_id) => result,
        };

        match result {
            Ok(status) => {
                let terminal = status.is_terminal();
                sink.emit(EngineEvent::Status { cycle, status });
                if terminal {
                    token.cancel();
                    return;
                }
            }
            Err(error) => sink.emit(EngineEvent::PollFailed { cycle, error }),
        }
    }
}
