use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use labelflow_engine::{
    ClientError, DownloadedArchive, EngineEvent, EventSink, FailureKind, PollRequest, Poller,
    ProcessingClient, RemoteState, RemoteStatus, Upload,
};
use tokio::runtime::Handle;

/// Answers status calls from a script; repeats the last answer once exhausted.
struct ScriptedClient {
    script: Mutex<VecDeque<Result<RemoteStatus, ClientError>>>,
    last: Mutex<Option<Result<RemoteStatus, ClientError>>>,
    calls: AtomicUsize,
}

impl ScriptedClient {
    fn new(script: Vec<Result<RemoteStatus, ClientError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ProcessingClient for ScriptedClient {
    async fn submit(&self, _upload: &Upload, _prompt: &str) -> Result<String, ClientError> {
        unreachable!("poller never submits")
    }

    async fn status(&self, _task_id: &str) -> Result<RemoteStatus, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        let mut last = self.last.lock().unwrap();
        if let Some(next) = next {
            *last = Some(next);
        }
        last.clone().expect("script is not empty")
    }

    async fn download(&self, _task_id: &str) -> Result<DownloadedArchive, ClientError> {
        unreachable!("poller never downloads")
    }
}

#[derive(Default)]
struct TestSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl TestSink {
    fn take(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for TestSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn processing(progress: u8) -> Result<RemoteStatus, ClientError> {
    Ok(RemoteStatus {
        state: RemoteState::Processing,
        progress: Some(progress),
        message: None,
    })
}

fn finished(state: RemoteState, message: Option<&str>) -> Result<RemoteStatus, ClientError> {
    Ok(RemoteStatus {
        state,
        progress: None,
        message: message.map(str::to_string),
    })
}

fn request(cycle: u64, max_duration: Option<Duration>) -> PollRequest {
    PollRequest {
        cycle,
        task_id: "abc123".to_string(),
        interval: Duration::from_millis(20),
        max_duration,
    }
}

fn progress_of(events: &[EngineEvent]) -> Vec<Option<u8>> {
    events
        .iter()
        .filter_map(|event| match event {
            EngineEvent::Status { status, .. } => Some(status.progress),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn polls_until_completed_then_stops() {
    let client = ScriptedClient::new(vec![
        processing(40),
        processing(75),
        finished(RemoteState::Completed, None),
    ]);
    let sink = Arc::new(TestSink::default());
    let mut poller = Poller::new();
    poller.start(&Handle::current(), client.clone(), request(1, None), sink.clone());

    tokio::time::sleep(Duration::from_millis(300)).await;

    let events = sink.take();
    assert_eq!(progress_of(&events), vec![Some(40), Some(75), None]);
    assert!(matches!(
        events.last(),
        Some(EngineEvent::Status { cycle: 1, status }) if status.state == RemoteState::Completed
    ));
    assert_eq!(client.calls(), 3);
    assert_eq!(poller.active_cycle(), None);
}

#[tokio::test]
async fn server_error_ends_polling() {
    let client = ScriptedClient::new(vec![finished(RemoteState::Error, Some("bad archive"))]);
    let sink = Arc::new(TestSink::default());
    let mut poller = Poller::new();
    poller.start(&Handle::current(), client.clone(), request(4, None), sink.clone());

    tokio::time::sleep(Duration::from_millis(200)).await;

    let events = sink.take();
    assert_eq!(events.len(), 1);
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn transport_failures_are_reported_and_polling_continues() {
    let client = ScriptedClient::new(vec![
        Err(ClientError {
            kind: FailureKind::Network,
            message: "connection refused".to_string(),
        }),
        processing(10),
        finished(RemoteState::Completed, None),
    ]);
    let sink = Arc::new(TestSink::default());
    let mut poller = Poller::new();
    poller.start(&Handle::current(), client.clone(), request(2, None), sink.clone());

    tokio::time::sleep(Duration::from_millis(300)).await;

    let events = sink.take();
    assert!(matches!(
        events.first(),
        Some(EngineEvent::PollFailed { cycle: 2, .. })
    ));
    assert_eq!(progress_of(&events), vec![Some(10), None]);
}

#[tokio::test]
async fn stop_prevents_further_polls() {
    let client = ScriptedClient::new(vec![processing(1)]);
    let sink = Arc::new(TestSink::default());
    let mut poller = Poller::new();
    poller.start(&Handle::current(), client.clone(), request(1, None), sink.clone());
    assert_eq!(poller.active_cycle(), Some(1));
    poller.stop();
    assert_eq!(poller.active_cycle(), None);

    tokio::time::sleep(Duration::from_millis(150)).await;

    assert!(sink.take().is_empty());
    assert_eq!(client.calls(), 0);
}

#[tokio::test]
async fn starting_a_new_cycle_cancels_the_previous_one() {
    let old_client = ScriptedClient::new(vec![processing(5)]);
    let new_client = ScriptedClient::new(vec![processing(50), finished(RemoteState::Completed, None)]);
    let sink = Arc::new(TestSink::default());
    let mut poller = Poller::new();
    poller.start(&Handle::current(), old_client.clone(), request(1, None), sink.clone());
    poller.start(&Handle::current(), new_client.clone(), request(2, None), sink.clone());

    tokio::time::sleep(Duration::from_millis(200)).await;

    let events = sink.take();
    assert!(!events.is_empty());
    assert!(events
        .iter()
        .all(|event| matches!(event, EngineEvent::Status { cycle: 2, .. })));
    assert_eq!(old_client.calls(), 0);
}

#[tokio::test]
async fn deadline_ends_a_stuck_cycle() {
    let client = ScriptedClient::new(vec![processing(1)]);
    let sink = Arc::new(TestSink::default());
    let mut poller = Poller::new();
    poller.start(
        &Handle::current(),
        client.clone(),
        request(3, Some(Duration::from_millis(50))),
        sink.clone(),
    );

    tokio::time::sleep(Duration::from_millis(300)).await;
    let events = sink.take();
    assert!(matches!(
        events.last(),
        Some(EngineEvent::PollDeadlineExceeded { cycle: 3 })
    ));

    let calls = client.calls();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(client.calls(), calls);
    assert!(sink.take().is_empty());
}
