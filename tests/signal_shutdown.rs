//! Delivers a real SIGTERM to the test process while a validation retry is
//! sleeping. Kept in its own test binary so the installed handler cannot
//! interfere with other tests.

#![cfg(unix)]

mod common;

use common::*;
use flight_crawler::lifecycle::wait_for_signal;
use flight_crawler::{CrawlerConfig, CrawlerSystem, ShutdownSignal};
use std::process::Command;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;

#[tokio::test]
async fn test_sigterm_during_retry_sleep_exits_promptly() {
    let temp_dir = TempDir::new().unwrap();
    let api = Arc::new(MockFlightApi::default());
    api.search_returns("ALA", "TSE", vec![flight_entry("stuck", "ALA", "TSE", 100.0, 0)]);
    api.search_returns("TSE", "ALA", vec![]);
    api.check_returns("stuck", vec![not_checked()]);

    let config = CrawlerConfig {
        retry_delay: Duration::from_secs(3600),
        check_period: Duration::from_millis(20),
        ..test_config(temp_dir.path())
    };
    let system = CrawlerSystem::with_api(config, api.clone()).unwrap();
    let running = tokio::spawn(system.run_until_shutdown(wait_for_signal()));

    // The first check answers "not checked" and the flight goes to sleep
    while api.calls_to("/check_flights") == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    tokio::time::sleep(Duration::from_millis(50)).await;

    let sent_at = Instant::now();
    let status = Command::new("sh")
        .arg("-c")
        .arg(format!("kill -TERM {}", std::process::id()))
        .status()
        .unwrap();
    assert!(status.success());

    let report = tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("shutdown should not wait for the retry sleep")
        .unwrap();

    assert_eq!(report.signal, Some(ShutdownSignal::Terminate));
    assert_eq!(report.stopped, 2);
    assert!(sent_at.elapsed() < Duration::from_secs(5));
}
