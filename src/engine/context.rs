// src/engine/context.rs

//! Everything a run needs, built once at startup and passed explicitly.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::RunSection;
use crate::errors::{Result, RunwrapError};
use crate::exec::{ProcessLauncher, ShellLauncher};
use crate::fs::{FileSystem, OpenRetryPolicy, RealFileSystem};
use crate::track::{DurableLog, HostInventory, HostSnapshot, SystemInventory};
use crate::types::Step;

/// Plain settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    /// Working directory of every step; logs, markers and the stop file
    /// live here.
    pub root: PathBuf,
    pub echo: bool,
    pub log_file: String,
    pub poll_interval: Duration,
    pub open_retry: OpenRetryPolicy,
    /// Programs launched as `<program>.bat`.
    pub batch_wrapped: Vec<String>,
}

impl RunSettings {
    /// Settings with every `[run]` default applied.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_section(root, &RunSection::default(), false)
    }

    /// Settings from a run file's `[run]` section. `quiet` wins over
    /// `echo = true`.
    pub fn from_section(root: impl Into<PathBuf>, section: &RunSection, quiet: bool) -> Self {
        Self {
            root: root.into(),
            echo: section.echo && !quiet,
            log_file: section.log_file.clone(),
            poll_interval: Duration::from_millis(section.poll_interval_ms),
            open_retry: OpenRetryPolicy::from(&section.open_retry),
            batch_wrapped: section.batch_wrapped.clone(),
        }
    }

    /// The program text actually handed to the shell for `step`.
    pub fn launch_program(&self, step: &Step) -> String {
        if self.batch_wrapped.iter().any(|p| p == step.program()) {
            format!("{}.bat", step.program())
        } else {
            step.program().to_string()
        }
    }

    /// Full command line for `step`.
    pub fn command_line(&self, step: &Step) -> String {
        let program = self.launch_program(step);
        let args = step.args().trim();
        if args.is_empty() {
            program
        } else {
            format!("{program} {args}")
        }
    }
}

/// External collaborators, injectable for tests.
#[derive(Debug, Clone)]
pub struct RunServices {
    pub fs: Arc<dyn FileSystem>,
    pub launcher: Arc<dyn ProcessLauncher>,
    pub inventory: Arc<dyn HostInventory>,
}

impl RunServices {
    /// The real filesystem, the platform shell and the local host.
    pub fn system() -> Self {
        Self {
            fs: Arc::new(RealFileSystem),
            launcher: Arc::new(ShellLauncher),
            inventory: Arc::new(SystemInventory),
        }
    }
}

/// Run-wide state: settings, collaborators, the open run log and the host
/// snapshot taken at the first launch.
pub struct RunContext {
    pub(crate) settings: RunSettings,
    pub(crate) services: RunServices,
    pub(crate) log: DurableLog,
    host: Option<HostSnapshot>,
}

impl fmt::Debug for RunContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunContext")
            .field("settings", &self.settings)
            .field("log", &self.log)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

impl RunContext {
    /// Check the run root and open the run log.
    pub async fn open(settings: RunSettings, services: RunServices) -> Result<Self> {
        if !services.fs.is_dir(&settings.root) {
            return Err(RunwrapError::ConfigError(format!(
                "run root {} is not a directory",
                settings.root.display()
            )));
        }

        let log = DurableLog::open(
            services.fs.as_ref(),
            &settings.root,
            &settings.log_file,
            &settings.open_retry,
            settings.echo,
        )
        .await?;

        info!(
            root = %settings.root.display(),
            log = %log.path().display(),
            echo = settings.echo,
            "run log opened"
        );

        Ok(Self {
            settings,
            services,
            log,
            host: None,
        })
    }

    /// Host facts for begin markers. Queried on first use only, so every
    /// step of a run records the same snapshot.
    pub fn host_snapshot(&mut self) -> HostSnapshot {
        if let Some(ref host) = self.host {
            return host.clone();
        }

        let host = self.services.inventory.snapshot();
        debug!(?host, "host inventory captured");
        self.host = Some(host.clone());
        host
    }
}
