// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunwrapError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// A non-transient failure while opening a file in the run root.
    #[error("Exception caught trying to open file {}: {source}", path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Every open attempt hit a transient failure.
    #[error("Failed to open file {} after {attempts} attempts", path.display())]
    OpenRetriesExhausted { path: PathBuf, attempts: u32 },

    #[error("Failed to launch step '{step}': {source}")]
    SpawnFailed {
        step: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RunwrapError>;
