// tests/open_retry.rs

mod common;
use crate::common::*;

use std::error::Error;
use std::io::{ErrorKind, Write};
use std::time::Duration;

use runwrap::engine::RunContext;
use runwrap::errors::RunwrapError;
use runwrap::fs::mock::MockFileSystem;
use runwrap::fs::{DIAGNOSTIC_FILE, OpenRetryPolicy, open_with_retry};
use runwrap::track::DurableLog;

type TestResult = Result<(), Box<dyn Error>>;

const LOG: &str = "runme.log";

#[tokio::test]
async fn busy_nine_times_then_success_opens_without_diagnostic() -> TestResult {
    init_tracing();

    let fs = mock_fs();
    let log_path = mock_root().join(LOG);
    fs.fail_next_opens(&log_path, 9, ErrorKind::ResourceBusy);

    let mut file = open_with_retry(&fs, &mock_root(), LOG, &OpenRetryPolicy::immediate(10)).await?;
    file.write_all(b"hello\n")?;

    assert_eq!(fs.open_attempts(&log_path), 10);
    assert_eq!(fs.contents(&log_path).as_deref(), Some("hello\n"));
    assert!(fs.contents(mock_root().join(DIAGNOSTIC_FILE)).is_none());

    Ok(())
}

#[tokio::test]
async fn busy_on_every_attempt_is_fatal_and_writes_diagnostic() -> TestResult {
    init_tracing();

    let fs = mock_fs();
    let log_path = mock_root().join(LOG);
    fs.fail_next_opens(&log_path, 10, ErrorKind::ResourceBusy);

    let result = open_with_retry(&fs, &mock_root(), LOG, &OpenRetryPolicy::immediate(10)).await;

    match result {
        Err(RunwrapError::OpenRetriesExhausted { path, attempts }) => {
            assert_eq!(path, log_path);
            assert_eq!(attempts, 10);
        }
        Err(e) => panic!("expected OpenRetriesExhausted, got {e:?}"),
        Ok(_) => panic!("expected an error"),
    }

    assert_eq!(fs.open_attempts(&log_path), 10);
    let diagnostic = fs
        .contents(mock_root().join(DIAGNOSTIC_FILE))
        .expect("exception.log written");
    assert!(diagnostic.contains(&format!("Failed to open file {}", log_path.display())));
    assert!(diagnostic.contains("\tException name: ResourceBusy"));

    Ok(())
}

#[tokio::test]
async fn not_found_is_retried_like_busy() -> TestResult {
    init_tracing();

    let fs = mock_fs();
    let log_path = mock_root().join(LOG);
    fs.fail_next_opens(&log_path, 3, ErrorKind::NotFound);

    open_with_retry(&fs, &mock_root(), LOG, &OpenRetryPolicy::immediate(10)).await?;
    assert_eq!(fs.open_attempts(&log_path), 4);

    Ok(())
}

#[tokio::test]
async fn unexpected_error_is_not_retried_and_is_captured() -> TestResult {
    init_tracing();

    let fs = mock_fs();
    let log_path = mock_root().join(LOG);
    fs.fail_next_opens(&log_path, 1, ErrorKind::PermissionDenied);

    let result = open_with_retry(&fs, &mock_root(), LOG, &OpenRetryPolicy::immediate(10)).await;

    match result {
        Err(RunwrapError::OpenFailed { path, source }) => {
            assert_eq!(path, log_path);
            assert_eq!(source.kind(), ErrorKind::PermissionDenied);
        }
        Err(e) => panic!("expected OpenFailed, got {e:?}"),
        Ok(_) => panic!("expected an error"),
    }
    assert_eq!(fs.open_attempts(&log_path), 1);

    let diagnostic = fs
        .contents(mock_root().join(DIAGNOSTIC_FILE))
        .expect("exception.log written");
    let lines: Vec<&str> = diagnostic.lines().collect();
    assert_eq!(
        lines[0],
        format!("ERROR: Exception caught trying to open file {}", log_path.display())
    );
    assert_eq!(lines[1], "\tException name: PermissionDenied");
    assert_eq!(lines[2], "\tException error code: n/a");
    assert!(lines[3].starts_with("\tException message: injected open failure"));

    Ok(())
}

#[tokio::test]
async fn existing_diagnostic_is_left_untouched() -> TestResult {
    init_tracing();

    let fs = mock_fs();
    let diagnostic_path = mock_root().join(DIAGNOSTIC_FILE);
    fs.add_file(&diagnostic_path, "first failure\n");
    fs.fail_next_opens(mock_root().join(LOG), 1, ErrorKind::PermissionDenied);

    let result = open_with_retry(&fs, &mock_root(), LOG, &OpenRetryPolicy::immediate(10)).await;
    assert!(result.is_err());
    assert_eq!(fs.contents(&diagnostic_path).as_deref(), Some("first failure\n"));

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn existing_file_waits_out_the_grace_period_once() -> TestResult {
    init_tracing();

    let fs = mock_fs();
    let log_path = mock_root().join(LOG);
    fs.add_file(&log_path, "previous run\n");

    let started = tokio::time::Instant::now();
    open_with_retry(&fs, &mock_root(), LOG, &OpenRetryPolicy::default()).await?;
    let waited = started.elapsed();

    assert!(waited >= Duration::from_secs(5), "waited only {waited:?}");
    assert!(waited < Duration::from_secs(6), "waited {waited:?}");
    assert_eq!(fs.open_attempts(&log_path), 1);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn transient_failures_back_off_one_interval_each() -> TestResult {
    init_tracing();

    let fs = mock_fs();
    let log_path = mock_root().join(LOG);
    fs.fail_next_opens(&log_path, 3, ErrorKind::ResourceBusy);

    let started = tokio::time::Instant::now();
    open_with_retry(&fs, &mock_root(), LOG, &OpenRetryPolicy::default()).await?;
    let waited = started.elapsed();

    // New file: no grace period, just three one-second backoffs.
    assert!(waited >= Duration::from_secs(3), "waited only {waited:?}");
    assert!(waited < Duration::from_secs(4), "waited {waited:?}");

    Ok(())
}

#[tokio::test]
async fn run_context_fails_when_log_cannot_be_opened() -> TestResult {
    init_tracing();

    let fs = mock_fs();
    fs.fail_next_opens(mock_root().join(LOG), 10, ErrorKind::ResourceBusy);
    let launcher = FakeLauncher::new();

    let result = RunContext::open(
        fast_settings(mock_root()),
        services(fs.clone(), launcher.clone(), FixedInventory::default()),
    )
    .await;

    assert!(matches!(result, Err(RunwrapError::OpenRetriesExhausted { .. })));
    assert!(launcher.launches().is_empty());
    assert!(fs.contents(mock_root().join(DIAGNOSTIC_FILE)).is_some());

    Ok(())
}

#[tokio::test]
async fn run_context_rejects_missing_root() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    let result = RunContext::open(
        fast_settings("/does/not/exist"),
        services(fs, FakeLauncher::new(), FixedInventory::default()),
    )
    .await;

    assert!(matches!(result, Err(RunwrapError::ConfigError(_))));
    Ok(())
}

#[tokio::test]
async fn durable_log_appends_to_existing_content() -> TestResult {
    init_tracing();

    let fs = mock_fs();
    let log_path = mock_root().join(LOG);
    fs.add_file(&log_path, "from an earlier run\n");

    let mut log = DurableLog::open(&fs, &mock_root(), LOG, &OpenRetryPolicy::immediate(10), false).await?;
    log.out("first")?;
    log.err("second")?;

    assert_eq!(
        fs.contents(&log_path).as_deref(),
        Some("from an earlier run\nfirst\nsecond\n")
    );
    Ok(())
}
