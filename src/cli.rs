// src/cli.rs

//! CLI argument parsing using `clap`.

use std::ffi::OsString;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `runwrap`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "runwrap",
    version,
    about = "Run toolchain steps in order with a durable log and lifecycle markers.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the run file (TOML) listing the steps.
    #[arg(long, value_name = "PATH", default_value = "runwrap.toml")]
    pub config: String,

    /// Run directory. Logs, markers and the stop file live here and steps
    /// are launched from here.
    ///
    /// Default: the directory containing the run file.
    #[arg(long, value_name = "DIR")]
    pub root: Option<String>,

    /// Do not echo run-log lines to the console.
    ///
    /// The single-dash spelling `-quiet` is accepted too.
    #[arg(long)]
    pub quiet: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNWRAP_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and validate the run file, print the steps, launch nothing.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Parse the process arguments.
pub fn parse() -> CliArgs {
    CliArgs::parse_from(normalize_legacy_flags(std::env::args_os()))
}

/// Rewrite `-quiet` to `--quiet`.
///
/// Generated launch scripts pass the flag with a single dash, which clap
/// would otherwise read as a cluster of short options.
pub fn normalize_legacy_flags<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            if arg == "-quiet" {
                OsString::from("--quiet")
            } else {
                arg
            }
        })
        .collect()
}
