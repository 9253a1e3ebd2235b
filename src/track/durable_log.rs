// src/track/durable_log.rs

//! The run log: one append-only text file per run, optionally mirrored to
//! the console.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::fs::{FileSystem, OpenRetryPolicy, open_with_retry};
use crate::types::LogChannel;

pub struct DurableLog {
    path: PathBuf,
    file: Box<dyn Write + Send>,
    echo: bool,
}

impl fmt::Debug for DurableLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DurableLog")
            .field("path", &self.path)
            .field("echo", &self.echo)
            .finish_non_exhaustive()
    }
}

impl DurableLog {
    /// Open (or create) `root/file_name` for appending.
    pub async fn open(
        fs: &dyn FileSystem,
        root: &Path,
        file_name: &str,
        policy: &OpenRetryPolicy,
        echo: bool,
    ) -> Result<Self> {
        let file = open_with_retry(fs, root, file_name, policy).await?;
        Ok(Self {
            path: root.join(file_name),
            file,
            echo,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `line` and a newline, flushing before returning.
    ///
    /// Console echo is best effort: a closed stdout/stderr never fails the
    /// run, a failed log write does.
    pub fn write_line(&mut self, channel: LogChannel, line: &str) -> Result<()> {
        writeln!(self.file, "{line}")?;
        self.file.flush()?;

        if self.echo {
            let _ = match channel {
                LogChannel::Out => writeln!(io::stdout().lock(), "{line}"),
                LogChannel::Err => writeln!(io::stderr().lock(), "{line}"),
            };
        }

        Ok(())
    }

    pub fn out(&mut self, line: &str) -> Result<()> {
        self.write_line(LogChannel::Out, line)
    }

    pub fn err(&mut self, line: &str) -> Result<()> {
        self.write_line(LogChannel::Err, line)
    }
}
