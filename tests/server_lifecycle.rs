//! Running server: listener, status endpoint and shutdown over real sockets.

use std::time::{Duration, Instant};

use graceful_close::config::{ResourceConfig, ServerConfig};
use graceful_close::lifecycle::startup::launch;
use graceful_close::lifecycle::{ShutdownState, ShutdownTrigger};
use serde_json::Value;

mod common;
use common::{position, CapturedLogs, RecordingExit};

fn test_config(resources: Vec<ResourceConfig>) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.resources = resources;
    config
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(2))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_health_lists_resources_then_listener_closes() {
    let logs = CapturedLogs::default();
    let _guard = logs.install();

    let config = test_config(vec![
        ResourceConfig::new("FirstDB", 0.3),
        ResourceConfig::new("SecondDB", 0.1),
    ]);
    let exit = RecordingExit::new(logs.clone());
    let launched = launch(config, exit.clone()).await.unwrap();
    let url = format!("http://{}/health", launched.local_addr);

    let res = client().get(&url).send().await.expect("server unreachable");
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["resources"], serde_json::json!(["FirstDB", "SecondDB"]));

    let start = Instant::now();
    let state = launched
        .sequencer
        .request_shutdown(ShutdownTrigger::Explicit, 0)
        .await;

    assert_eq!(state, Some(ShutdownState::Closed));
    assert!(start.elapsed() >= Duration::from_millis(300));
    assert!(client().get(&url).send().await.is_err(), "listener still accepting");

    let exits = exit.exits();
    assert_eq!(exits.len(), 1);
    let at_exit = &exits[0].logs_at_exit;
    assert!(position(at_exit, &["Successful closed", "FirstDB"]).is_some());
    assert!(position(at_exit, &["Successful closed", "SecondDB"]).is_some());
    assert!(position(at_exit, &["Application close hook ran"]).is_some());
}

#[tokio::test]
async fn test_configured_timeout_bounds_shutdown() {
    let logs = CapturedLogs::default();
    let _guard = logs.install();

    let mut config = test_config(vec![ResourceConfig::new("StuckDB", 30.0)]);
    config.shutdown.timeout_secs = Some(1);
    config.shutdown.exit_code = 3;

    let exit = RecordingExit::new(logs.clone());
    let launched = launch(config, exit.clone()).await.unwrap();

    let start = Instant::now();
    let state = launched
        .sequencer
        .request_shutdown(ShutdownTrigger::Explicit, 3)
        .await;

    assert_eq!(state, Some(ShutdownState::ClosedWithErrors));
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(exit.exits()[0].code, 3);
}

#[tokio::test]
async fn test_bind_failure_is_reported() {
    let taken = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let mut config = test_config(Vec::new());
    config.listener.bind_address = taken.local_addr().unwrap().to_string();

    let exit = RecordingExit::new(CapturedLogs::default());
    let err = launch(config, exit).await.err().unwrap();

    assert!(err.to_string().starts_with("failed to bind"));
}
