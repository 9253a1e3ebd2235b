// src/types.rs

//! Small value types shared across the run-tracking layers.

/// One unit of toolchain work: a program, its argument string and the id
/// used to name the step's lifecycle markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    id: String,
    program: String,
    args: String,
}

impl Step {
    /// Build a step whose id is derived from the program name
    /// (see [`derive_step_id`]).
    pub fn new(program: impl Into<String>, args: impl Into<String>) -> Self {
        let program = program.into();
        Self {
            id: derive_step_id(&program),
            program,
            args: args.into(),
        }
    }

    /// Override the derived step id.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &str {
        &self.args
    }
}

/// Derive a step id from a program name: the last path component without
/// its extension (`./tools/synth.sh` -> `synth`, `vivado` -> `vivado`).
///
/// Both `/` and `\` count as separators so generated Windows paths map to
/// the same id on every host.
pub fn derive_step_id(program: &str) -> String {
    let trimmed = program.trim();
    let base = trimmed
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(trimmed);

    let stem = match base.rfind('.') {
        Some(idx) if idx > 0 => &base[..idx],
        _ => base,
    };

    if stem.is_empty() {
        trimmed.to_string()
    } else {
        stem.to_string()
    }
}

/// Final outcome of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The process exited with code 0.
    Success,
    /// The process exited with a non-zero code (`-1` when it was terminated
    /// without reporting one).
    Failed(i32),
    /// The stop file was present; the step never started.
    Cancelled,
}

impl StepOutcome {
    pub fn from_exit_code(code: i32) -> Self {
        if code == 0 {
            StepOutcome::Success
        } else {
            StepOutcome::Failed(code)
        }
    }
}

/// Lifecycle status encoded in a marker file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarkerStatus {
    Begin,
    End,
    Error,
}

impl MarkerStatus {
    pub fn tag(self) -> &'static str {
        match self {
            MarkerStatus::Begin => "begin",
            MarkerStatus::End => "end",
            MarkerStatus::Error => "error",
        }
    }

    /// `End` for a zero exit code, `Error` otherwise.
    pub fn for_exit_code(code: i32) -> Self {
        if code == 0 {
            MarkerStatus::End
        } else {
            MarkerStatus::Error
        }
    }
}

/// Which console stream a run-log line is mirrored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogChannel {
    Out,
    Err,
}
