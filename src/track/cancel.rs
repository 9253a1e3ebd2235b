// src/track/cancel.rs

//! Cooperative cancellation through a stop file in the run root.
//!
//! An outer orchestrator creates `.stop.rst` to ask the run to halt. The
//! file is only ever read here, never created or removed, and its contents
//! are ignored.

use std::path::{Path, PathBuf};

use crate::fs::FileSystem;

pub const STOP_FILE: &str = ".stop.rst";

/// Lines written to the run log when a run halts on the stop file.
pub const HALT_BANNER: [&str; 3] = ["", "*** Halting run - EA reset detected ***", ""];

pub fn stop_file_path(root: &Path) -> PathBuf {
    root.join(STOP_FILE)
}

pub fn should_abort(fs: &dyn FileSystem, root: &Path) -> bool {
    fs.exists(&stop_file_path(root))
}
