// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`backend`] provides the [`ProcessLauncher`] / [`StepProcess`] traits
//!   and the production [`ShellLauncher`]; tests substitute a scripted
//!   launcher.
//! - [`step_runner`] runs one step end to end: stop-file check, header,
//!   launch, output draining and lifecycle markers.

pub mod backend;
pub mod step_runner;

pub use backend::{LineFuture, MAX_LINE_BYTES, ProcessLauncher, ShellLauncher, StepProcess};
pub use step_runner::run_step;
