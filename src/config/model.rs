// src/config/model.rs

use serde::Deserialize;

use crate::types::Step;

/// Run file exactly as read from TOML, before validation.
///
/// ```toml
/// [run]
/// log_file = "runme.log"
/// echo = true
/// poll_interval_ms = 100
///
/// [run.open_retry]
/// existing_file_grace_ms = 5000
/// attempts = 10
/// backoff_ms = 1000
///
/// [[step]]
/// program = "vivado"
/// args = "-mode batch -source synth.tcl"
/// id = "synth"
/// ```
///
/// Every section except `[[step]]` is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRunFile {
    #[serde(default)]
    pub run: RunSection,

    /// Steps in execution order.
    #[serde(default)]
    pub step: Vec<StepConfig>,
}

/// A run file that passed validation.
///
/// Only obtainable through `TryFrom<RawRunFile>` (see `validate.rs`), so
/// holding one means the step list is non-empty and step ids are unique.
#[derive(Debug, Clone)]
pub struct RunFile {
    pub run: RunSection,
    pub step: Vec<StepConfig>,
}

impl RunFile {
    pub(crate) fn new_unchecked(run: RunSection, step: Vec<StepConfig>) -> Self {
        Self { run, step }
    }

    /// Steps in declared order.
    pub fn steps(&self) -> Vec<Step> {
        self.step.iter().map(StepConfig::to_step).collect()
    }
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RunSection {
    /// Log file name, relative to the run root.
    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// Mirror run-log lines to the console. `--quiet` forces this off.
    #[serde(default = "default_echo")]
    pub echo: bool,

    /// Interval between liveness polls of a running step.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Programs that are launched as `<program>.bat`.
    #[serde(default = "default_batch_wrapped")]
    pub batch_wrapped: Vec<String>,

    #[serde(default)]
    pub open_retry: OpenRetrySection,
}

/// `[run.open_retry]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenRetrySection {
    /// Wait applied once before opening a file that already exists.
    #[serde(default = "default_existing_file_grace_ms")]
    pub existing_file_grace_ms: u64,

    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Delay after each transient open failure.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

/// One `[[step]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
    pub program: String,

    /// Argument string, passed through to the shell unchanged.
    #[serde(default)]
    pub args: String,

    /// Marker id; defaults to the program's file stem.
    #[serde(default)]
    pub id: Option<String>,
}

impl StepConfig {
    pub fn to_step(&self) -> Step {
        let step = Step::new(self.program.clone(), self.args.clone());
        match self.id {
            Some(ref id) => step.with_id(id.clone()),
            None => step,
        }
    }

    /// The id this step's markers will use.
    pub fn effective_id(&self) -> String {
        self.to_step().id().to_string()
    }
}

fn default_log_file() -> String {
    "runme.log".to_string()
}

fn default_echo() -> bool {
    true
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_batch_wrapped() -> Vec<String> {
    if cfg!(windows) {
        ["realTimeFpga", "planAhead", "vivado"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    } else {
        Vec::new()
    }
}

fn default_existing_file_grace_ms() -> u64 {
    5_000
}

fn default_attempts() -> u32 {
    10
}

fn default_backoff_ms() -> u64 {
    1_000
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            log_file: default_log_file(),
            echo: default_echo(),
            poll_interval_ms: default_poll_interval_ms(),
            batch_wrapped: default_batch_wrapped(),
            open_retry: OpenRetrySection::default(),
        }
    }
}

impl Default for OpenRetrySection {
    fn default() -> Self {
        Self {
            existing_file_grace_ms: default_existing_file_grace_ms(),
            attempts: default_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}
