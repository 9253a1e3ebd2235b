pub mod builders;
pub mod fake_launcher;

use std::path::Path;
use std::sync::Once;

use runwrap::fs::mock::MockFileSystem;
use tracing_subscriber::{EnvFilter, fmt};

pub use builders::{RunFileBuilder, StepConfigBuilder, fast_settings, services};
pub use fake_launcher::{FakeLauncher, FixedInventory, Launch, Script};

static INIT: Once = Once::new();

/// Initialise tracing once per test binary.
///
/// Output goes through `with_test_writer()`, so it only shows up for
/// failing tests (or with `-- --nocapture`). The filter comes from
/// `RUNWRAP_LOG`, then `RUST_LOG`, then `info`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env("RUNWRAP_LOG")
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}

/// Names of the lifecycle marker files (`.*.rst`, stop file excluded) in a
/// real directory, sorted.
pub fn marker_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("reading run root")
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| is_marker_name(name))
        .collect();
    names.sort();
    names
}

/// Same as [`marker_files`] for a [`MockFileSystem`] rooted at `root`.
pub fn mock_marker_files(fs: &MockFileSystem, root: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs
        .file_paths()
        .into_iter()
        .filter(|path| path.parent() == Some(root))
        .filter_map(|path| path.file_name().and_then(|n| n.to_str()).map(str::to_string))
        .filter(|name| is_marker_name(name))
        .collect();
    names.sort();
    names
}

fn is_marker_name(name: &str) -> bool {
    name.starts_with('.') && name.ends_with(".rst") && name != runwrap::track::STOP_FILE
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}
