#![allow(dead_code)]

use std::path::PathBuf;

use runwrap::engine::RunContext;
use runwrap::fs::mock::MockFileSystem;
use runwrap::types::Step;

pub use runwrap_test_utils::*;

/// Run root used by in-memory runs.
pub const MOCK_ROOT: &str = "/work/proj/proj.runs/impl_1";

pub fn mock_root() -> PathBuf {
    PathBuf::from(MOCK_ROOT)
}

/// A mock filesystem containing just the run root.
pub fn mock_fs() -> MockFileSystem {
    MockFileSystem::with_dir(MOCK_ROOT)
}

/// Open a run context over `fs` with [`fast_settings`].
pub async fn mock_context(
    fs: &MockFileSystem,
    launcher: &FakeLauncher,
    inventory: &FixedInventory,
) -> RunContext {
    RunContext::open(
        fast_settings(mock_root()),
        services(fs.clone(), launcher.clone(), inventory.clone()),
    )
    .await
    .expect("opening run context")
}

/// `[("synth", "-top A"), ("impl", "-top A")]`.
pub fn synth_then_impl() -> Vec<Step> {
    vec![Step::new("synth", "-top A"), Step::new("impl", "-top A")]
}

/// Run log contents of a mock run.
pub fn mock_log(fs: &MockFileSystem) -> String {
    fs.contents(mock_root().join("runme.log"))
        .expect("run log exists")
}
