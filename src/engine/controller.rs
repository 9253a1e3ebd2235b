// src/engine/controller.rs

use tracing::{info, warn};

use crate::engine::RunContext;
use crate::errors::Result;
use crate::exec::run_step;
use crate::types::{Step, StepOutcome};

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every step exited 0.
    Completed,
    /// `step` exited with `exit_code`; later steps were not started.
    Failed { step: String, exit_code: i32 },
    /// The stop file was found before `step` could start.
    Cancelled { step: String },
}

impl RunOutcome {
    /// Exit code for the `runwrap` process itself.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Completed => 0,
            RunOutcome::Failed { exit_code, .. } => *exit_code,
            RunOutcome::Cancelled { .. } => 1,
        }
    }
}

/// Runs steps strictly in order, stopping at the first one that does not
/// succeed.
#[derive(Debug)]
pub struct RunController {
    ctx: RunContext,
}

impl RunController {
    pub fn new(ctx: RunContext) -> Self {
        Self { ctx }
    }

    pub async fn run(&mut self, steps: &[Step]) -> Result<RunOutcome> {
        info!(steps = steps.len(), "run started");

        for (index, step) in steps.iter().enumerate() {
            info!(step = step.id(), position = index + 1, "starting step");

            match run_step(&mut self.ctx, step).await? {
                StepOutcome::Success => continue,
                StepOutcome::Failed(exit_code) => {
                    warn!(step = step.id(), exit_code, "step failed; aborting run");
                    return Ok(RunOutcome::Failed {
                        step: step.id().to_string(),
                        exit_code,
                    });
                }
                StepOutcome::Cancelled => {
                    return Ok(RunOutcome::Cancelled {
                        step: step.id().to_string(),
                    });
                }
            }
        }

        info!("all steps completed");
        Ok(RunOutcome::Completed)
    }
}
