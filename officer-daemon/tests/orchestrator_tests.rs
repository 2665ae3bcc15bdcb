//! Orchestrator integration tests.
//!
//! Tests the full flow: config -> exporter + pipeline -> lines in -> metrics out -> shutdown.
//! Each test binds its own metrics port and runs serially.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use officer_core::config::OfficerConfig;
use officer_daemon::orchestrator::Orchestrator;
use serial_test::serial;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::sleep;

fn test_config(log_path: &Path, port: u16) -> OfficerConfig {
    let mut config = OfficerConfig::default();
    config.log_source.path = log_path.to_string_lossy().into_owned();
    config.log_source.poll_interval_ms = 10;
    config.rotation.enabled = false;
    config.metrics.listen_addr = "127.0.0.1".to_owned();
    config.metrics.port = port;
    config
}

fn text_line(path: &str, duration: &str) -> String {
    format!(
        r#"10.0.0.1 - - [10/Oct/2023:13:55:36 +0000] "GET {path} HTTP/1.1" 200 512 "-" "curl/8.0" 42 "api@docker" "http://10.0.0.5:8080" {duration}"#
    )
}

fn append_lines(path: &Path, lines: &[String]) {
    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .unwrap();
    for line in lines {
        writeln!(file, "{line}").unwrap();
    }
}

async fn scrape(port: u16) -> String {
    let mut stream = tokio::net::TcpStream::connect(("127.0.0.1", port))
        .await
        .expect("failed to connect to metrics endpoint");
    stream
        .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

#[tokio::test]
#[serial]
async fn test_build_fails_on_invalid_config() {
    let mut config = OfficerConfig::default();
    config.general.log_level = "verbose".to_owned();

    let result = Orchestrator::build_from_config(config).await;
    assert!(result.is_err(), "invalid log level should be rejected");
}

#[tokio::test]
#[serial]
async fn test_build_fails_on_unsupported_endpoint() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir.path().join("access.log"), 19181);
    config.metrics.endpoint = "/custom".to_owned();

    let result = Orchestrator::build_from_config(config).await;
    assert!(result.is_err());
}

#[tokio::test]
#[serial]
async fn test_lines_become_prometheus_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("access.log");
    let rules = dir.path().join("rules.json");
    std::fs::write(&rules, r#"{"IgnoredPathsRegex": ["^/static/"]}"#).unwrap();

    append_lines(
        &log,
        &[
            text_line("/api/orders", "12ms"),
            text_line("/api/orders", "3ms"),
            text_line("/static/app.js", "1ms"),
        ],
    );

    let mut config = test_config(&log, 19182);
    config.filter.rules_file = Some(rules.to_string_lossy().into_owned());

    let mut orchestrator = Orchestrator::build_from_config(config).await.unwrap();
    let handle = orchestrator.metrics_handle().clone();

    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let checker = tokio::spawn(async move {
        let mut body = String::new();
        for _ in 0..200 {
            handle.run_upkeep();
            body = scrape(19182).await;
            if body.contains("traefik_officer_lines_processed 3") {
                break;
            }
            sleep(Duration::from_millis(25)).await;
        }
        let _ = stop_tx.send(());
        body
    });

    orchestrator
        .run_until(async {
            let _ = stop_rx.await;
            "test"
        })
        .await
        .unwrap();

    let body = checker.await.unwrap();
    assert!(body.contains("200 OK"), "unexpected response: {body}");
    assert!(body.contains("traefik_officer_lines_processed 3"));
    assert!(body.contains("traefik_officer_lines_ignored 1"));
    assert!(body.contains("traefik_officer_latency_bucket"));
    assert!(body.contains(r#"RequestPath="/api/orders""#));
    assert!(body.contains(r#"RequestMethod="GET""#));
    assert!(body.contains(r#"le="10000""#));
    assert!(!body.contains(r#"RequestPath="/static/app.js""#));
    // text logs carry no overhead
    assert!(!body.contains("traefik_officer_overhead{"));
}

#[tokio::test]
#[serial]
async fn test_health_before_and_after_run() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("later.log");

    let mut orchestrator = Orchestrator::build_from_config(test_config(&log, 19183))
        .await
        .unwrap();
    assert!(orchestrator.health().await.is_unhealthy());
    assert_eq!(orchestrator.config().metrics.port, 19183);

    orchestrator
        .run_until(async {
            sleep(Duration::from_millis(100)).await;
            "test"
        })
        .await
        .unwrap();

    assert!(orchestrator.health().await.is_unhealthy());
}

#[tokio::test]
#[serial]
async fn test_unavailable_log_source_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&dir.path().join("never.log"), 19184);
    config.log_source.open_timeout_secs = 1;

    let mut orchestrator = Orchestrator::build_from_config(config).await.unwrap();

    let result = tokio::time::timeout(
        Duration::from_secs(10),
        orchestrator.run_until(std::future::pending::<&'static str>()),
    )
    .await
    .expect("orchestrator should exit on its own");

    let err = result.unwrap_err();
    assert!(err.to_string().contains("log pipeline failed"));
}
