// src/exec/step_runner.rs

//! Runs a single step.
//!
//! Order of events for one step:
//! 1. stop file check (a present stop file ends the step as `Cancelled`,
//!    with no marker written);
//! 2. header lines in the run log, before anything is launched;
//! 3. launch through the run's [`ProcessLauncher`](crate::exec::ProcessLauncher);
//! 4. begin marker with pid and host snapshot;
//! 5. poll loop draining output into the run log until the process exits;
//! 6. end or error marker, chosen by the exit code.

use std::time::Duration;

use tokio::time::{MissedTickBehavior, interval, timeout};
use tracing::{debug, info, warn};

use crate::engine::RunContext;
use crate::errors::{Result, RunwrapError};
use crate::exec::StepProcess;
use crate::track::cancel::HALT_BANNER;
use crate::track::{DurableLog, LifecycleMarker, ProcessIdentity, should_abort};
use crate::types::{Step, StepOutcome};

/// Run `step` to completion.
///
/// `Err` is reserved for failures of the run itself (launch failure, log or
/// marker I/O). A step that exits non-zero is `Ok(StepOutcome::Failed(_))`.
pub async fn run_step(ctx: &mut RunContext, step: &Step) -> Result<StepOutcome> {
    if should_abort(ctx.services.fs.as_ref(), &ctx.settings.root) {
        warn!(step = step.id(), "stop file present; halting run before launch");
        for line in HALT_BANNER {
            ctx.log.err(line)?;
        }
        return Ok(StepOutcome::Cancelled);
    }

    write_header(&mut ctx.log, step)?;

    let command = ctx.settings.launch_program(step);
    let command_line = ctx.settings.command_line(step);

    let mut process = ctx
        .services
        .launcher
        .launch(&command_line, &ctx.settings.root)
        .map_err(|source| RunwrapError::SpawnFailed {
            step: step.id().to_string(),
            source,
        })?;

    let pid = process.id();
    info!(step = step.id(), pid, cmd = %command_line, "step process started");

    let identity = ProcessIdentity {
        command,
        pid,
        host: ctx.host_snapshot(),
    };

    let markers = LifecycleMarker::new(
        ctx.services.fs.as_ref(),
        &ctx.settings.root,
        &ctx.settings.open_retry,
    );
    markers.begin(step.id(), &identity).await?;

    let exit_code = match drain_until_exit(
        process.as_mut(),
        &mut ctx.log,
        ctx.settings.poll_interval,
    )
    .await
    {
        Ok(code) => code,
        Err(err) => {
            // A begun step always gets a terminal marker.
            warn!(step = step.id(), error = %err, "step supervision failed; marking step as errored");
            if let Err(marker_err) = markers.error(step.id()).await {
                warn!(step = step.id(), error = %marker_err, "could not write error marker");
            }
            return Err(err);
        }
    };

    let status = markers.finish(step.id(), exit_code).await?;
    info!(
        step = step.id(),
        pid,
        exit_code,
        marker = status.tag(),
        "step process exited"
    );

    Ok(StepOutcome::from_exit_code(exit_code))
}

fn write_header(log: &mut DurableLog, step: &Step) -> Result<()> {
    log.out("")?;
    log.out(&format!("*** Running {}", step.program()))?;
    log.out(&format!("    with args {}", step.args()))?;
    log.out("")?;
    Ok(())
}

enum PollEvent {
    Line(std::io::Result<Option<String>>),
    Tick,
}

/// Copy process output into the log until the process exits, then return
/// its exit code.
///
/// Available output always wins over the poll tick, so every line the
/// process produced before a liveness check is logged before that check.
/// Between ticks the loop sleeps `poll_interval`, trading a little log
/// latency for not spinning a core.
async fn drain_until_exit(
    process: &mut dyn StepProcess,
    log: &mut DurableLog,
    poll_interval: Duration,
) -> Result<i32> {
    let mut ticker = interval(poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut stream_open = true;

    let exit_code = loop {
        let event = tokio::select! {
            biased;
            line = process.next_line(), if stream_open => PollEvent::Line(line),
            _ = ticker.tick() => PollEvent::Tick,
        };

        match event {
            PollEvent::Line(Ok(Some(line))) => log.out(&line)?,
            PollEvent::Line(Ok(None)) => {
                debug!("step output stream closed");
                stream_open = false;
            }
            PollEvent::Line(Err(err)) => {
                // The process may close its end on exit; not an error.
                debug!(error = %err, "reading step output failed; treating as end of stream");
                stream_open = false;
            }
            PollEvent::Tick => {
                if let Some(code) = process.try_wait()? {
                    break code;
                }
            }
        }
    };

    if stream_open {
        drain_remaining(process, log, poll_interval).await?;
    }

    Ok(exit_code)
}

/// After exit, pick up output still sitting in the pipe. Stops at end of
/// stream, or after `quiet_period` without output in case a detached
/// grandchild still holds the pipe open.
async fn drain_remaining(
    process: &mut dyn StepProcess,
    log: &mut DurableLog,
    quiet_period: Duration,
) -> Result<()> {
    loop {
        match timeout(quiet_period, process.next_line()).await {
            Ok(Ok(Some(line))) => log.out(&line)?,
            Ok(Ok(None)) | Ok(Err(_)) => return Ok(()),
            Err(_) => {
                debug!("no further output after process exit");
                return Ok(());
            }
        }
    }
}
