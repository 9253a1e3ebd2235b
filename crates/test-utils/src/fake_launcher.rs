use std::collections::{HashMap, HashSet, VecDeque};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use runwrap::exec::{LineFuture, ProcessLauncher, StepProcess};
use runwrap::track::{HostInventory, HostSnapshot};

/// What a scripted program prints and how it exits.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub output: Vec<String>,
    pub exit_code: i32,
}

/// One recorded `launch` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launch {
    pub command_line: String,
    pub cwd: PathBuf,
    pub pid: u32,
}

/// A launcher that never spawns anything:
/// - picks a [`Script`] by the first word of the command line (unknown
///   programs print nothing and exit 0),
/// - records every launch,
/// - can be told to fail the spawn for a program.
#[derive(Debug, Clone)]
pub struct FakeLauncher {
    scripts: Arc<Mutex<HashMap<String, Script>>>,
    spawn_failures: Arc<Mutex<HashSet<String>>>,
    launched: Arc<Mutex<Vec<Launch>>>,
    next_pid: Arc<AtomicU32>,
}

impl Default for FakeLauncher {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeLauncher {
    pub fn new() -> Self {
        Self {
            scripts: Arc::new(Mutex::new(HashMap::new())),
            spawn_failures: Arc::new(Mutex::new(HashSet::new())),
            launched: Arc::new(Mutex::new(Vec::new())),
            next_pid: Arc::new(AtomicU32::new(4000)),
        }
    }

    pub fn script(self, program: &str, output: &[&str], exit_code: i32) -> Self {
        self.scripts.lock().unwrap().insert(
            program.to_string(),
            Script {
                output: output.iter().map(|s| s.to_string()).collect(),
                exit_code,
            },
        );
        self
    }

    pub fn fail_spawn(self, program: &str) -> Self {
        self.spawn_failures
            .lock()
            .unwrap()
            .insert(program.to_string());
        self
    }

    pub fn launches(&self) -> Vec<Launch> {
        self.launched.lock().unwrap().clone()
    }

    pub fn command_lines(&self) -> Vec<String> {
        self.launches()
            .into_iter()
            .map(|l| l.command_line)
            .collect()
    }
}

impl ProcessLauncher for FakeLauncher {
    fn launch(&self, command_line: &str, cwd: &Path) -> io::Result<Box<dyn StepProcess>> {
        let program = command_line
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_string();

        if self.spawn_failures.lock().unwrap().contains(&program) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{program}: command not found"),
            ));
        }

        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(&program)
            .cloned()
            .unwrap_or_default();

        let pid = self.next_pid.fetch_add(1, Ordering::SeqCst);
        self.launched.lock().unwrap().push(Launch {
            command_line: command_line.to_string(),
            cwd: cwd.to_path_buf(),
            pid,
        });

        Ok(Box::new(ScriptedProcess {
            pid,
            output: script.output.into(),
            exit_code: script.exit_code,
        }))
    }
}

/// Emits its scripted lines, then reports its exit code once they are all
/// consumed.
struct ScriptedProcess {
    pid: u32,
    output: VecDeque<String>,
    exit_code: i32,
}

impl StepProcess for ScriptedProcess {
    fn id(&self) -> Option<u32> {
        Some(self.pid)
    }

    fn next_line(&mut self) -> LineFuture<'_> {
        let line = self.output.pop_front();
        Box::pin(async move { Ok(line) })
    }

    fn try_wait(&mut self) -> io::Result<Option<i32>> {
        if self.output.is_empty() {
            Ok(Some(self.exit_code))
        } else {
            Ok(None)
        }
    }
}

/// Host inventory returning a fixed snapshot and counting queries.
#[derive(Debug, Clone)]
pub struct FixedInventory {
    snapshot: HostSnapshot,
    queries: Arc<AtomicUsize>,
}

impl FixedInventory {
    pub fn new(snapshot: HostSnapshot) -> Self {
        Self {
            snapshot,
            queries: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl Default for FixedInventory {
    fn default() -> Self {
        Self::new(HostSnapshot {
            user: "builder".to_string(),
            host: "fpga-build-01".to_string(),
            logical_cores: 16,
            total_memory_bytes: 68_719_476_736,
        })
    }
}

impl HostInventory for FixedInventory {
    fn snapshot(&self) -> HostSnapshot {
        self.queries.fetch_add(1, Ordering::SeqCst);
        self.snapshot.clone()
    }
}
