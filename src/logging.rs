// src/logging.rs

//! Diagnostic logging for `runwrap` using `tracing` + `tracing-subscriber`.
//!
//! Filter selection, first match wins:
//! 1. `--log-level` CLI flag
//! 2. `RUNWRAP_LOG` environment variable, parsed as an `EnvFilter` directive
//!    (e.g. `debug` or `runwrap::exec=trace,info`)
//! 3. `info`
//!
//! Diagnostics describe what `runwrap` itself is doing and go to STDERR.
//! They never end up in the run log, which only carries step headers and
//! tool output.

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::LogLevel;

pub const LOG_ENV_VAR: &str = "RUNWRAP_LOG";

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let filter = match cli_level {
        Some(lvl) => EnvFilter::new(lvl.as_directive()),
        None => match std::env::var(LOG_ENV_VAR) {
            Ok(directive) if !directive.trim().is_empty() => EnvFilter::try_new(directive.trim())
                .with_context(|| format!("parsing {LOG_ENV_VAR}"))?,
            _ => EnvFilter::new("info"),
        },
    };

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing tracing subscriber: {e}"))?;

    Ok(())
}
