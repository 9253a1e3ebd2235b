// tests/config_loading.rs

mod common;
use crate::common::*;

use std::error::Error;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use runwrap::cli::{CliArgs, normalize_legacy_flags};
use runwrap::config::{RunFile, load_and_validate, load_from_str, run_file_root_dir};
use runwrap::engine::RunSettings;
use runwrap::errors::RunwrapError;
use runwrap::fs::OpenRetryPolicy;
use runwrap::types::derive_step_id;

type TestResult = Result<(), Box<dyn Error>>;

fn demo_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("demos/impl_1.toml")
}

fn config_error_of(raw: runwrap::config::RawRunFile) -> String {
    match RunFile::try_from(raw) {
        Err(RunwrapError::ConfigError(msg)) => msg,
        Err(other) => panic!("expected ConfigError, got {other:?}"),
        Ok(_) => panic!("expected validation to fail"),
    }
}

#[test]
fn demo_run_file_loads_in_declared_order() -> TestResult {
    init_tracing();

    let run_file = load_and_validate(demo_path())?;
    let steps = run_file.steps();

    let ids: Vec<&str> = steps.iter().map(|s| s.id()).collect();
    assert_eq!(ids, vec!["synth", "impl", "write_bitstream"]);
    assert_eq!(steps[2].program(), "./scripts/write_bitstream.sh");
    assert_eq!(steps[2].args(), "top.dcp");

    assert_eq!(run_file.run.log_file, "runme.log");
    assert_eq!(run_file.run.open_retry.attempts, 10);

    Ok(())
}

#[test]
fn omitted_sections_take_defaults() -> TestResult {
    let raw = load_from_str(
        r#"
[[step]]
program = "synth"
"#,
    )?;
    let run_file = RunFile::try_from(raw)?;

    assert_eq!(run_file.run.log_file, "runme.log");
    assert!(run_file.run.echo);
    assert_eq!(run_file.run.poll_interval_ms, 100);
    assert_eq!(run_file.run.open_retry.existing_file_grace_ms, 5_000);
    assert_eq!(run_file.run.open_retry.attempts, 10);
    assert_eq!(run_file.run.open_retry.backoff_ms, 1_000);
    if cfg!(windows) {
        assert_eq!(
            run_file.run.batch_wrapped,
            vec!["realTimeFpga", "planAhead", "vivado"]
        );
    } else {
        assert!(run_file.run.batch_wrapped.is_empty());
    }

    let steps = run_file.steps();
    assert_eq!(steps[0].id(), "synth");
    assert_eq!(steps[0].args(), "");

    Ok(())
}

#[test]
fn malformed_toml_is_a_parse_error() {
    let result = load_from_str("[[step]]\nprogram = ");
    assert!(matches!(result, Err(RunwrapError::TomlError(_))));
}

#[test]
fn empty_step_list_is_rejected() {
    let msg = config_error_of(RunFileBuilder::new().raw());
    assert!(msg.contains("at least one [[step]]"), "{msg}");
}

#[test]
fn duplicate_derived_ids_are_rejected() {
    let raw = RunFileBuilder::new()
        .with_step(StepConfigBuilder::new("vivado").args("-source synth.tcl").build())
        .with_step(StepConfigBuilder::new("/opt/Xilinx/bin/vivado").args("-source impl.tcl").build())
        .raw();

    let msg = config_error_of(raw);
    assert!(msg.contains("step #2 reuses id 'vivado'"), "{msg}");
}

#[test]
fn explicit_ids_resolve_duplicate_programs() -> TestResult {
    let run_file = RunFileBuilder::new()
        .with_step(StepConfigBuilder::new("vivado").id("synth").build())
        .with_step(StepConfigBuilder::new("vivado").id("impl").build())
        .build();

    let ids: Vec<String> = run_file.steps().iter().map(|s| s.id().to_string()).collect();
    assert_eq!(ids, vec!["synth", "impl"]);
    Ok(())
}

#[test]
fn ids_that_would_escape_the_marker_name_are_rejected() {
    for bad in ["../synth", "a b", ".hidden", ""] {
        let raw = RunFileBuilder::new()
            .with_step(StepConfigBuilder::new("synth").id(bad).build())
            .raw();
        let msg = config_error_of(raw);
        assert!(msg.contains("invalid id"), "{bad:?}: {msg}");
    }
}

#[test]
fn empty_program_is_rejected() {
    let raw = RunFileBuilder::new()
        .with_step(StepConfigBuilder::new("  ").build())
        .raw();
    let msg = config_error_of(raw);
    assert!(msg.contains("empty `program`"), "{msg}");
}

#[test]
fn zero_poll_interval_and_zero_attempts_are_rejected() {
    let raw = RunFileBuilder::new()
        .with_step(StepConfigBuilder::new("synth").build())
        .poll_interval_ms(0)
        .raw();
    assert!(config_error_of(raw).contains("poll_interval_ms"));

    let raw = RunFileBuilder::new()
        .with_step(StepConfigBuilder::new("synth").build())
        .attempts(0)
        .raw();
    assert!(config_error_of(raw).contains("attempts"));

    let raw = RunFileBuilder::new()
        .with_step(StepConfigBuilder::new("synth").build())
        .log_file(" ")
        .raw();
    assert!(config_error_of(raw).contains("log_file"));
}

#[test]
fn step_ids_are_program_file_stems() {
    assert_eq!(derive_step_id("vivado"), "vivado");
    assert_eq!(derive_step_id("./tools/synth.sh"), "synth");
    assert_eq!(derive_step_id(r"C:\Xilinx\bin\planAhead.bat"), "planAhead");
    assert_eq!(derive_step_id("/opt/tools/place.route.py"), "place.route");
    assert_eq!(derive_step_id(".hidden"), ".hidden");
}

#[test]
fn run_file_directory_is_the_default_root() {
    assert_eq!(
        run_file_root_dir(Path::new("/work/proj/impl_1/runwrap.toml")),
        PathBuf::from("/work/proj/impl_1")
    );
    assert_eq!(
        run_file_root_dir(Path::new("runwrap.toml")),
        std::env::current_dir().expect("cwd")
    );
}

#[test]
fn settings_follow_the_run_section_and_quiet_wins() -> TestResult {
    let raw = load_from_str(
        r#"
[run]
log_file = "impl.log"
echo = true
poll_interval_ms = 250
batch_wrapped = ["vivado"]

[run.open_retry]
existing_file_grace_ms = 0
attempts = 3
backoff_ms = 20

[[step]]
program = "vivado"
args = "-mode batch"
"#,
    )?;
    let run_file = RunFile::try_from(raw)?;

    let settings = RunSettings::from_section("/runs/impl_1", &run_file.run, false);
    assert!(settings.echo);
    assert_eq!(settings.log_file, "impl.log");
    assert_eq!(settings.poll_interval, Duration::from_millis(250));
    assert_eq!(
        settings.open_retry,
        OpenRetryPolicy {
            existing_file_grace: Duration::ZERO,
            attempts: 3,
            backoff: Duration::from_millis(20),
        }
    );

    let step = &run_file.steps()[0];
    assert_eq!(settings.command_line(step), "vivado.bat -mode batch");

    let quiet = RunSettings::from_section("/runs/impl_1", &run_file.run, true);
    assert!(!quiet.echo);

    Ok(())
}

#[test]
fn single_dash_quiet_is_accepted() -> TestResult {
    let argv = ["runwrap", "-quiet", "--config", "impl_1.toml"].map(OsString::from);
    let args = CliArgs::try_parse_from(normalize_legacy_flags(argv))?;

    assert!(args.quiet);
    assert_eq!(args.config, "impl_1.toml");
    assert!(args.root.is_none());
    assert!(!args.dry_run);

    Ok(())
}

#[test]
fn cli_defaults() -> TestResult {
    let args = CliArgs::try_parse_from(["runwrap"])?;
    assert_eq!(args.config, "runwrap.toml");
    assert!(!args.quiet);
    assert!(args.log_level.is_none());
    Ok(())
}
