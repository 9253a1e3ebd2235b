#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use runwrap::config::{RawRunFile, RunFile, RunSection, StepConfig};
use runwrap::engine::{RunServices, RunSettings};
use runwrap::fs::{FileSystem, OpenRetryPolicy};
use runwrap::exec::ProcessLauncher;
use runwrap::track::HostInventory;

/// Builder for `RunFile` to simplify test setup.
pub struct RunFileBuilder {
    raw: RawRunFile,
}

impl RunFileBuilder {
    pub fn new() -> Self {
        Self {
            raw: RawRunFile {
                run: RunSection::default(),
                step: Vec::new(),
            },
        }
    }

    pub fn with_step(mut self, step: StepConfig) -> Self {
        self.raw.step.push(step);
        self
    }

    pub fn log_file(mut self, name: &str) -> Self {
        self.raw.run.log_file = name.to_string();
        self
    }

    pub fn echo(mut self, val: bool) -> Self {
        self.raw.run.echo = val;
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.raw.run.poll_interval_ms = ms;
        self
    }

    pub fn attempts(mut self, attempts: u32) -> Self {
        self.raw.run.open_retry.attempts = attempts;
        self
    }

    pub fn raw(self) -> RawRunFile {
        self.raw
    }

    pub fn build(self) -> RunFile {
        RunFile::try_from(self.raw).expect("Failed to build valid run file from builder")
    }
}

impl Default for RunFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `StepConfig`.
pub struct StepConfigBuilder {
    step: StepConfig,
}

impl StepConfigBuilder {
    pub fn new(program: &str) -> Self {
        Self {
            step: StepConfig {
                program: program.to_string(),
                args: String::new(),
                id: None,
            },
        }
    }

    pub fn args(mut self, args: &str) -> Self {
        self.step.args = args.to_string();
        self
    }

    pub fn id(mut self, id: &str) -> Self {
        self.step.id = Some(id.to_string());
        self
    }

    pub fn build(self) -> StepConfig {
        self.step
    }
}

/// Settings for tests: no console echo, no retry waits, 1 ms polling, no
/// `.bat` wrapping.
pub fn fast_settings(root: impl Into<PathBuf>) -> RunSettings {
    let mut settings = RunSettings::new(root);
    settings.echo = false;
    settings.poll_interval = Duration::from_millis(1);
    settings.open_retry = OpenRetryPolicy::immediate(10);
    settings.batch_wrapped.clear();
    settings
}

pub fn services(
    fs: impl FileSystem + 'static,
    launcher: impl ProcessLauncher + 'static,
    inventory: impl HostInventory + 'static,
) -> RunServices {
    RunServices {
        fs: Arc::new(fs),
        launcher: Arc::new(launcher),
        inventory: Arc::new(inventory),
    }
}
