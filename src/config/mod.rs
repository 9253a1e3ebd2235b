// src/config/mod.rs

//! Run file loading and validation.
//!
//! - `model.rs`: TOML-backed data model (`[run]`, `[[step]]`).
//! - `loader.rs`: reading a run file from disk.
//! - `validate.rs`: step list and `[run]` sanity checks.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_from_str, run_file_root_dir};
pub use model::{OpenRetrySection, RawRunFile, RunFile, RunSection, StepConfig};
pub use validate::validate_run_file;
