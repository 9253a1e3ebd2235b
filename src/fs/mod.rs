// src/fs/mod.rs

//! Filesystem access for everything the run writes into its root: the run
//! log, lifecycle markers and the diagnostic file.
//!
//! Errors stay as raw `io::Error`s here because the open-retry policy in
//! [`retry`] decides what to do based on the error kind.

use std::fmt::Debug;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

pub mod mock;
pub mod retry;

pub use retry::{DIAGNOSTIC_FILE, OpenRetryPolicy, open_with_retry};

/// Abstract filesystem interface.
pub trait FileSystem: Send + Sync + Debug {
    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Open `path` for appending, creating it when missing.
    fn open_append(&self, path: &Path) -> io::Result<Box<dyn Write + Send>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn exists(&self, path: &Path) -> bool {
        fs::metadata(path).is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn open_append(&self, path: &Path) -> io::Result<Box<dyn Write + Send>> {
        let file = OpenOptions::new().append(true).create(true).open(path)?;
        Ok(Box::new(file))
    }
}
