use std::time::{Duration, Instant};

use labelflow_engine::{
    ClientSettings, EngineConfig, EngineEvent, EngineEvents, EngineHandle, PollRequest,
    RemoteState, Upload,
};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn next_event(events: &EngineEvents) -> EngineEvent {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(event) = events.try_recv() {
            return event;
        }
        assert!(Instant::now() < deadline, "engine produced no event");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn engine_for(server: &MockServer, output: &TempDir) -> (EngineHandle, EngineEvents) {
    let config = EngineConfig {
        client: ClientSettings {
            base_url: server.uri(),
            ..ClientSettings::default()
        },
        output_dir: output.path().join("downloads"),
    };
    EngineHandle::new(config).expect("engine")
}

#[tokio::test(flavor = "multi_thread")]
async fn full_cycle_submit_poll_download() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "task_id": "abc123",
            "status": "processing",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "completed",
            "result_file": "results/abc123.zip",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/download/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"PK\x05\x06done".to_vec(), "application/zip"))
        .mount(&server)
        .await;

    let workdir = TempDir::new().unwrap();
    let archive = workdir.path().join("batch.zip");
    std::fs::write(&archive, b"PK\x03\x04input").unwrap();
    let (engine, events) = engine_for(&server, &workdir);

    engine.submit(
        7,
        Upload {
            path: archive,
            file_name: "batch.zip".to_string(),
            mime: Some("application/zip".to_string()),
        },
        "Find all objects",
    );
    match next_event(&events).await {
        EngineEvent::Submitted { cycle: 7, result } => assert_eq!(result.unwrap(), "abc123"),
        other => panic!("unexpected event {other:?}"),
    }

    engine.start_polling(PollRequest {
        cycle: 7,
        task_id: "abc123".to_string(),
        interval: Duration::from_millis(20),
        max_duration: None,
    });
    match next_event(&events).await {
        EngineEvent::Status { cycle: 7, status } => {
            assert_eq!(status.state, RemoteState::Completed)
        }
        other => panic!("unexpected event {other:?}"),
    }

    engine.download("abc123", "processed_batch.zip");
    match next_event(&events).await {
        EngineEvent::Downloaded { task_id, result } => {
            assert_eq!(task_id, "abc123");
            let saved = result.expect("saved");
            assert_eq!(saved, workdir.path().join("downloads").join("processed_batch.zip"));
            assert_eq!(std::fs::read(saved).unwrap(), b"PK\x05\x06done");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn stop_polling_silences_the_engine() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/slow"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "processing",
            "progress": 10,
        })))
        .mount(&server)
        .await;

    let workdir = TempDir::new().unwrap();
    let (engine, events) = engine_for(&server, &workdir);
    engine.start_polling(PollRequest {
        cycle: 1,
        task_id: "slow".to_string(),
        interval: Duration::from_millis(200),
        max_duration: None,
    });
    engine.stop_polling();

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert!(events.try_recv().is_none());
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_submission_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/process"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let workdir = TempDir::new().unwrap();
    let archive = workdir.path().join("batch.zip");
    std::fs::write(&archive, b"PK\x03\x04input").unwrap();
    let (engine, events) = engine_for(&server, &workdir);
    engine.submit(
        1,
        Upload {
            path: archive,
            file_name: "batch.zip".to_string(),
            mime: None,
        },
        "cats",
    );

    match next_event(&events).await {
        EngineEvent::Submitted { cycle: 1, result } => assert!(result.is_err()),
        other => panic!("unexpected event {other:?}"),
    }
}
