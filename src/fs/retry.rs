// src/fs/retry.rs

//! Contention-tolerant file opening.
//!
//! Two runs launched back to back in the same directory can race on the run
//! log and marker files: the second open sometimes fails even though the
//! first run already closed its handle. The root cause was never pinned
//! down, so the policy stays blunt:
//!
//! 1. if the file already exists, wait a grace period once;
//! 2. try to open it up to `attempts` times;
//! 3. a transient failure sleeps `backoff` and retries;
//! 4. any other failure, or running out of attempts, is fatal and is
//!    recorded in `exception.log` in the run root.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, error, warn};

use super::FileSystem;
use crate::config::OpenRetrySection;
use crate::errors::{Result, RunwrapError};

/// Diagnostic file written on the first unrecoverable open failure.
pub const DIAGNOSTIC_FILE: &str = "exception.log";

/// Windows `ERROR_SHARING_VIOLATION` and `ERROR_LOCK_VIOLATION`.
const SHARING_VIOLATION: i32 = 32;
const LOCK_VIOLATION: i32 = 33;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenRetryPolicy {
    pub existing_file_grace: Duration,
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for OpenRetryPolicy {
    fn default() -> Self {
        Self {
            existing_file_grace: Duration::from_secs(5),
            attempts: 10,
            backoff: Duration::from_secs(1),
        }
    }
}

impl OpenRetryPolicy {
    /// Same attempt budget, no waiting at all.
    pub fn immediate(attempts: u32) -> Self {
        Self {
            existing_file_grace: Duration::ZERO,
            attempts,
            backoff: Duration::ZERO,
        }
    }
}

impl From<&OpenRetrySection> for OpenRetryPolicy {
    fn from(section: &OpenRetrySection) -> Self {
        Self {
            existing_file_grace: Duration::from_millis(section.existing_file_grace_ms),
            attempts: section.attempts,
            backoff: Duration::from_millis(section.backoff_ms),
        }
    }
}

/// Whether an open failure is worth retrying.
pub fn is_transient(err: &io::Error) -> bool {
    let locked_by_other_process = cfg!(windows)
        && matches!(err.raw_os_error(), Some(SHARING_VIOLATION | LOCK_VIOLATION));

    locked_by_other_process
        || matches!(
            err.kind(),
            io::ErrorKind::NotFound | io::ErrorKind::ResourceBusy | io::ErrorKind::WouldBlock
        )
}

/// Open `root/file_name` for appending under `policy`.
pub async fn open_with_retry(
    fs: &dyn FileSystem,
    root: &Path,
    file_name: &str,
    policy: &OpenRetryPolicy,
) -> Result<Box<dyn Write + Send>> {
    let path = root.join(file_name);

    if fs.exists(&path) && !policy.existing_file_grace.is_zero() {
        debug!(
            path = %path.display(),
            grace_ms = policy.existing_file_grace.as_millis() as u64,
            "file already exists; waiting before opening it"
        );
        tokio::time::sleep(policy.existing_file_grace).await;
    }

    let mut last_err = None;
    for attempt in 1..=policy.attempts {
        match fs.open_append(&path) {
            Ok(writer) => {
                if attempt > 1 {
                    debug!(path = %path.display(), attempt, "file opened after retrying");
                }
                return Ok(writer);
            }
            Err(err) if is_transient(&err) => {
                warn!(
                    path = %path.display(),
                    attempt,
                    attempts = policy.attempts,
                    error = %err,
                    "transient failure opening file; retrying"
                );
                last_err = Some(err);
                tokio::time::sleep(policy.backoff).await;
            }
            Err(err) => {
                eprintln!("ERROR: Exception caught trying to open file {}", path.display());
                record_open_failure(fs, root, &path, "Exception caught trying to open file", &err);
                return Err(RunwrapError::OpenFailed { path, source: err });
            }
        }
    }

    eprintln!("ERROR: Failed to open file {}", path.display());
    if let Some(err) = last_err {
        record_open_failure(fs, root, &path, "Failed to open file", &err);
    }
    Err(RunwrapError::OpenRetriesExhausted {
        path,
        attempts: policy.attempts,
    })
}

/// Write the failure details to `exception.log`, unless an earlier failure
/// already created it. Problems writing the diagnostic itself are only
/// traced; the open error is what gets propagated.
fn record_open_failure(fs: &dyn FileSystem, root: &Path, path: &Path, headline: &str, err: &io::Error) {
    let diagnostic: PathBuf = root.join(DIAGNOSTIC_FILE);
    if fs.exists(&diagnostic) {
        return;
    }

    eprintln!("See file {} for details.", diagnostic.display());

    let code = err
        .raw_os_error()
        .map(|c| c.to_string())
        .unwrap_or_else(|| "n/a".to_string());
    let body = format!(
        "ERROR: {headline} {}\n\tException name: {:?}\n\tException error code: {code}\n\tException message: {err}\n",
        path.display(),
        err.kind(),
    );

    let written = fs
        .open_append(&diagnostic)
        .and_then(|mut file| {
            file.write_all(body.as_bytes())?;
            file.flush()
        });

    match written {
        Ok(()) => error!(
            path = %path.display(),
            diagnostic = %diagnostic.display(),
            error = %err,
            "unrecoverable open failure recorded"
        ),
        Err(write_err) => warn!(
            diagnostic = %diagnostic.display(),
            error = %write_err,
            "could not write diagnostic file"
        ),
    }
}
