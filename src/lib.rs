// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod track;
pub mod types;

use std::path::PathBuf;

use anyhow::Result;
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{load_and_validate, run_file_root_dir};
use crate::engine::{RunContext, RunController, RunServices, RunSettings};
use crate::types::Step;

/// High-level entry point used by `main.rs`. Returns the process exit code.
///
/// This wires together:
/// - run file loading
/// - run settings (CLI overrides on top of `[run]`)
/// - the run context (run log opened here)
/// - the step controller
pub async fn run(args: CliArgs) -> Result<i32> {
    let run_file_path = PathBuf::from(&args.config);
    let run_file = load_and_validate(&run_file_path)?;

    let root = match args.root {
        Some(ref root) => PathBuf::from(root),
        None => run_file_root_dir(&run_file_path),
    };

    let settings = RunSettings::from_section(root, &run_file.run, args.quiet);
    let steps = run_file.steps();

    if args.dry_run {
        print_dry_run(&settings, &steps);
        return Ok(0);
    }

    let ctx = RunContext::open(settings, RunServices::system()).await?;
    let mut controller = RunController::new(ctx);
    let outcome = controller.run(&steps).await?;

    info!(?outcome, exit_code = outcome.exit_code(), "run finished");
    Ok(outcome.exit_code())
}

/// Print the resolved run without launching anything.
fn print_dry_run(settings: &RunSettings, steps: &[Step]) {
    println!("runwrap dry-run");
    println!("  root = {}", settings.root.display());
    println!("  log_file = {}", settings.log_file);
    println!("  echo = {}", settings.echo);
    println!("  poll_interval = {:?}", settings.poll_interval);
    println!();

    println!("steps ({}):", steps.len());
    for step in steps {
        println!("  - {}", step.id());
        println!("      cmd: {}", settings.command_line(step));
    }

    debug!("dry-run complete (no execution)");
}
