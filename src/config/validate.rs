// src/config/validate.rs

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::model::{RawRunFile, RunFile};
use crate::errors::{Result, RunwrapError};

/// Step ids end up inside marker file names (`.<id>.begin.rst`), so they
/// are restricted to a single, separator-free path component.
static STEP_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.+-]*$").expect("static regex"));

impl TryFrom<RawRunFile> for RunFile {
    type Error = RunwrapError;

    fn try_from(raw: RawRunFile) -> std::result::Result<Self, Self::Error> {
        validate_run_file(&raw)?;
        Ok(RunFile::new_unchecked(raw.run, raw.step))
    }
}

/// Validate a raw run file without consuming it.
pub fn validate_run_file(cfg: &RawRunFile) -> Result<()> {
    ensure_has_steps(cfg)?;
    validate_run_section(cfg)?;
    validate_steps(cfg)?;
    Ok(())
}

fn ensure_has_steps(cfg: &RawRunFile) -> Result<()> {
    if cfg.step.is_empty() {
        return Err(RunwrapError::ConfigError(
            "run file must contain at least one [[step]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_run_section(cfg: &RawRunFile) -> Result<()> {
    let run = &cfg.run;

    if run.log_file.trim().is_empty() {
        return Err(RunwrapError::ConfigError(
            "[run].log_file must not be empty".to_string(),
        ));
    }

    if run.poll_interval_ms == 0 {
        return Err(RunwrapError::ConfigError(
            "[run].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if run.open_retry.attempts == 0 {
        return Err(RunwrapError::ConfigError(
            "[run.open_retry].attempts must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_steps(cfg: &RawRunFile) -> Result<()> {
    let mut seen = HashSet::new();

    for (index, step) in cfg.step.iter().enumerate() {
        let position = index + 1;

        if step.program.trim().is_empty() {
            return Err(RunwrapError::ConfigError(format!(
                "step #{position} has an empty `program`"
            )));
        }

        let id = step.effective_id();
        if !STEP_ID_RE.is_match(&id) {
            return Err(RunwrapError::ConfigError(format!(
                "step #{position} has invalid id '{id}' (allowed: letters, digits, '_', '.', '+', '-')"
            )));
        }

        if !seen.insert(id.clone()) {
            return Err(RunwrapError::ConfigError(format!(
                "step #{position} reuses id '{id}'; set a distinct `id` so its markers do not collide"
            )));
        }
    }

    Ok(())
}
