// src/fs/mock.rs

//! In-memory [`FileSystem`] with open-failure injection, for tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::FileSystem;

#[derive(Debug, Default)]
struct MockState {
    files: HashMap<PathBuf, Vec<u8>>,
    dirs: HashSet<PathBuf>,
    /// Errors returned by the next `open_append` calls for a path, in order.
    faults: HashMap<PathBuf, VecDeque<io::ErrorKind>>,
    open_attempts: HashMap<PathBuf, usize>,
}

#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// A mock with `root` already present as a directory.
    pub fn with_dir(root: impl AsRef<Path>) -> Self {
        let fs = Self::new();
        fs.add_dir(root);
        fs
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.state.lock().unwrap();
        state.dirs.insert(path.as_ref().to_path_buf());
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut state = self.state.lock().unwrap();
        state
            .files
            .insert(path.as_ref().to_path_buf(), content.into());
    }

    /// Make the next `count` opens of `path` fail with `kind`.
    pub fn fail_next_opens(&self, path: impl AsRef<Path>, count: usize, kind: io::ErrorKind) {
        let mut state = self.state.lock().unwrap();
        let queue = state.faults.entry(path.as_ref().to_path_buf()).or_default();
        queue.extend(std::iter::repeat_n(kind, count));
    }

    /// Current contents of a file, if it exists.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .files
            .get(path.as_ref())
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// How many times `open_append` was called for `path`, failures included.
    pub fn open_attempts(&self, path: impl AsRef<Path>) -> usize {
        let state = self.state.lock().unwrap();
        state
            .open_attempts
            .get(path.as_ref())
            .copied()
            .unwrap_or(0)
    }

    /// All file paths, sorted.
    pub fn file_paths(&self) -> Vec<PathBuf> {
        let state = self.state.lock().unwrap();
        let mut paths: Vec<PathBuf> = state.files.keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl FileSystem for MockFileSystem {
    fn exists(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        let state = self.state.lock().unwrap();
        state.dirs.contains(path)
    }

    fn open_append(&self, path: &Path) -> io::Result<Box<dyn Write + Send>> {
        let mut state = self.state.lock().unwrap();
        *state.open_attempts.entry(path.to_path_buf()).or_insert(0) += 1;

        if let Some(kind) = state.faults.get_mut(path).and_then(|queue| queue.pop_front()) {
            return Err(io::Error::new(kind, format!("injected open failure for {path:?}")));
        }

        state.files.entry(path.to_path_buf()).or_default();

        Ok(Box::new(MockWriter {
            path: path.to_path_buf(),
            state: Arc::clone(&self.state),
        }))
    }
}

/// Appends straight into the shared file map, so every write is visible
/// immediately, like a flushed file.
struct MockWriter {
    path: PathBuf,
    state: Arc<Mutex<MockState>>,
}

impl Write for MockWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock().unwrap();
        state
            .files
            .entry(self.path.clone())
            .or_default()
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
