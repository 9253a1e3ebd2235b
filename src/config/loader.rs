// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawRunFile, RunFile};
use crate::errors::Result;

/// Read and deserialize a run file without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawRunFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    load_from_str(&contents)
}

/// Deserialize a run file from TOML text.
pub fn load_from_str(contents: &str) -> Result<RawRunFile> {
    let raw: RawRunFile = toml::from_str(contents)?;
    Ok(raw)
}

/// Load a run file and validate it. This is what the binary uses.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<RunFile> {
    let raw = load_from_path(&path)?;
    RunFile::try_from(raw)
}

/// Directory a run file lives in, used as the default run root.
///
/// A bare file name (`runwrap.toml`, parent = "") resolves to the current
/// working directory.
pub fn run_file_root_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
