// src/exec/backend.rs

//! Pluggable process launching.
//!
//! The step runner talks to a [`ProcessLauncher`] instead of spawning
//! processes itself, so tests can swap in a scripted launcher that never
//! touches the OS.
//!
//! - [`ShellLauncher`] is the production implementation: it runs the
//!   command line through the platform shell and reads stdout and stderr
//!   as one stream of lines.
//! - A launched step is a [`StepProcess`]: a source of output lines plus a
//!   non-blocking exit check.

use std::fmt::Debug;
use std::future::Future;
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tracing::debug;

/// Future returned by [`StepProcess::next_line`].
pub type LineFuture<'a> = Pin<Box<dyn Future<Output = io::Result<Option<String>>> + Send + 'a>>;

/// A running step process.
pub trait StepProcess: Send {
    /// OS process id, if known.
    fn id(&self) -> Option<u32>;

    /// Next line of merged stdout/stderr, without its terminator.
    /// `Ok(None)` means the stream is closed.
    ///
    /// Must be cancel safe: dropping the future before it completes may not
    /// lose output.
    fn next_line(&mut self) -> LineFuture<'_>;

    /// Exit code if the process has terminated, `None` while it runs.
    /// Termination without an exit code is reported as `-1`.
    fn try_wait(&mut self) -> io::Result<Option<i32>>;
}

/// Starts step processes.
pub trait ProcessLauncher: Send + Sync + Debug {
    fn launch(&self, command_line: &str, cwd: &Path) -> io::Result<Box<dyn StepProcess>>;
}

/// Longest line handed to the run log. Output without a newline is cut
/// into chunks of this size.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Launches command lines through `cmd /C` (Windows) or `sh -c` (elsewhere).
///
/// `2>&1` merges the tool's stderr into stdout inside the shell. The
/// shell's own stderr (syntax errors, the left side of `a && b`) is piped
/// as well, so both end up in the run log.
#[derive(Debug, Clone, Default)]
pub struct ShellLauncher;

impl ProcessLauncher for ShellLauncher {
    fn launch(&self, command_line: &str, cwd: &Path) -> io::Result<Box<dyn StepProcess>> {
        let mut cmd = shell_command(command_line);
        cmd.current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn()?;
        let stdout = child.stdout.take().map(LineReader::new);
        let stderr = child.stderr.take().map(LineReader::new);

        Ok(Box::new(ShellProcess {
            child,
            stdout,
            stderr,
        }))
    }
}

#[cfg(windows)]
fn shell_command(command_line: &str) -> Command {
    let mut c = Command::new("cmd");
    // Passed raw so cmd sees the line exactly as written, quotes included.
    c.arg("/C").raw_arg(format!("{command_line} 2>&1"));
    c
}

#[cfg(not(windows))]
fn shell_command(command_line: &str) -> Command {
    let mut c = Command::new("sh");
    c.arg("-c").arg(format!("{command_line} 2>&1"));
    c
}

/// Splits a byte stream into lines of at most [`MAX_LINE_BYTES`].
struct LineReader<R> {
    reader: BufReader<R>,
    /// Bytes of a line whose terminator has not arrived yet. Kept here,
    /// not in the future, so a cancelled read loses nothing.
    pending: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            pending: Vec::new(),
        }
    }

    async fn next_line(&mut self) -> io::Result<Option<String>> {
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                if self.pending.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(self.take_line()));
            }

            let room = MAX_LINE_BYTES - self.pending.len();
            let window = &available[..available.len().min(room)];

            if let Some(end) = window.iter().position(|b| *b == b'\n') {
                self.pending.extend_from_slice(&window[..end]);
                self.reader.consume(end + 1);
                return Ok(Some(self.take_line()));
            }

            let taken = window.len();
            self.pending.extend_from_slice(window);
            self.reader.consume(taken);
            if self.pending.len() >= MAX_LINE_BYTES {
                return Ok(Some(self.take_line()));
            }
        }
    }

    fn take_line(&mut self) -> String {
        let mut line = std::mem::take(&mut self.pending);
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        // Tool output is not guaranteed to be UTF-8.
        String::from_utf8_lossy(&line).into_owned()
    }
}

struct ShellProcess {
    child: Child,
    stdout: Option<LineReader<ChildStdout>>,
    stderr: Option<LineReader<ChildStderr>>,
}

impl StepProcess for ShellProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn next_line(&mut self) -> LineFuture<'_> {
        Box::pin(async move {
            loop {
                let (read, from_stdout) = match (self.stdout.as_mut(), self.stderr.as_mut()) {
                    (None, None) => return Ok(None),
                    (Some(out), None) => (out.next_line().await, true),
                    (None, Some(err)) => (err.next_line().await, false),
                    (Some(out), Some(err)) => tokio::select! {
                        biased;
                        line = out.next_line() => (line, true),
                        line = err.next_line() => (line, false),
                    },
                };

                match read {
                    Ok(Some(line)) => return Ok(Some(line)),
                    Ok(None) => {}
                    Err(err) => {
                        debug!(error = %err, from_stdout, "reading step output failed; closing stream");
                    }
                }

                // One stream is done; keep reading the other.
                if from_stdout {
                    self.stdout = None;
                } else {
                    self.stderr = None;
                }
            }
        })
    }

    fn try_wait(&mut self) -> io::Result<Option<i32>> {
        Ok(self
            .child
            .try_wait()?
            .map(|status| status.code().unwrap_or(-1)))
    }
}
