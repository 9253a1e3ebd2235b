// src/track/markers.rs

//! Lifecycle marker files.
//!
//! For every step that starts, the run root gets:
//! - `.<id>.begin.rst`: a small XML handle describing the launched process,
//! - then exactly one of `.<id>.end.rst` (exit 0) or `.<id>.error.rst`
//!   (any other exit), both empty.
//!
//! Progress monitors poll for these instead of parsing the run log.

use std::borrow::Cow;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::Result;
use crate::fs::{FileSystem, OpenRetryPolicy, open_with_retry};
use crate::track::inventory::HostSnapshot;
use crate::types::MarkerStatus;

pub fn marker_file_name(step_id: &str, status: MarkerStatus) -> String {
    format!(".{step_id}.{}.rst", status.tag())
}

pub fn marker_path(root: &Path, step_id: &str, status: MarkerStatus) -> PathBuf {
    root.join(marker_file_name(step_id, status))
}

/// Identity of a launched step process, serialized into the begin marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessIdentity {
    /// Program as launched (after any `.bat` wrapping).
    pub command: String,
    pub pid: Option<u32>,
    pub host: HostSnapshot,
}

impl ProcessIdentity {
    pub fn to_xml(&self) -> String {
        let pid = self.pid.map(|p| p.to_string()).unwrap_or_default();
        format!(
            concat!(
                "<?xml version=\"1.0\"?>\n",
                "<ProcessHandle Version=\"1\" Minor=\"0\">\n",
                "    <Process Command=\"{command}\" Owner=\"{owner}\" Host=\"{host}\" Pid=\"{pid}\" HostCore=\"{cores}\" HostMemory=\"{memory}\">\n",
                "    </Process>\n",
                "</ProcessHandle>\n",
            ),
            command = escape_attr(&self.command),
            owner = escape_attr(&self.host.user),
            host = escape_attr(&self.host.host),
            pid = pid,
            cores = self.host.logical_cores,
            memory = self.host.total_memory_bytes,
        )
    }
}

fn escape_attr(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }

    let mut out = String::with_capacity(value.len() + 8);
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

/// Writes marker files into a run root. Every file goes through the same
/// open-retry policy as the run log.
#[derive(Debug, Clone, Copy)]
pub struct LifecycleMarker<'a> {
    fs: &'a dyn FileSystem,
    root: &'a Path,
    policy: &'a OpenRetryPolicy,
}

impl<'a> LifecycleMarker<'a> {
    pub fn new(fs: &'a dyn FileSystem, root: &'a Path, policy: &'a OpenRetryPolicy) -> Self {
        Self { fs, root, policy }
    }

    pub async fn begin(&self, step_id: &str, identity: &ProcessIdentity) -> Result<PathBuf> {
        self.write(step_id, MarkerStatus::Begin, identity.to_xml().as_bytes())
            .await
    }

    pub async fn end(&self, step_id: &str) -> Result<PathBuf> {
        self.write(step_id, MarkerStatus::End, &[]).await
    }

    pub async fn error(&self, step_id: &str) -> Result<PathBuf> {
        self.write(step_id, MarkerStatus::Error, &[]).await
    }

    /// Write `end` or `error` depending on the exit code.
    pub async fn finish(&self, step_id: &str, exit_code: i32) -> Result<MarkerStatus> {
        let status = MarkerStatus::for_exit_code(exit_code);
        match status {
            MarkerStatus::End => self.end(step_id).await?,
            _ => self.error(step_id).await?,
        };
        Ok(status)
    }

    async fn write(&self, step_id: &str, status: MarkerStatus, body: &[u8]) -> Result<PathBuf> {
        let name = marker_file_name(step_id, status);
        let mut file = open_with_retry(self.fs, self.root, &name, self.policy).await?;
        if !body.is_empty() {
            file.write_all(body)?;
        }
        file.flush()?;

        let path = self.root.join(name);
        debug!(step = step_id, status = status.tag(), path = %path.display(), "marker written");
        Ok(path)
    }
}
