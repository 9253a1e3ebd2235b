// src/track/inventory.rs

//! Host identity recorded in begin markers.

use std::fmt::Debug;

use sysinfo::System;

const UNKNOWN: &str = "unknown";

/// Who is running the step and on what machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostSnapshot {
    pub user: String,
    pub host: String,
    pub logical_cores: usize,
    pub total_memory_bytes: u64,
}

/// Source of [`HostSnapshot`]s. Queried once per run.
pub trait HostInventory: Send + Sync + Debug {
    fn snapshot(&self) -> HostSnapshot;
}

/// Reads the current machine through `sysinfo` and `num_cpus`.
///
/// Anything that cannot be determined degrades to `"unknown"` or `0`; a
/// missing host name is no reason to fail a build.
#[derive(Debug, Clone, Default)]
pub struct SystemInventory;

impl HostInventory for SystemInventory {
    fn snapshot(&self) -> HostSnapshot {
        let mut sys = System::new();
        sys.refresh_memory();

        HostSnapshot {
            user: current_user(),
            host: System::host_name().unwrap_or_else(|| UNKNOWN.to_string()),
            logical_cores: num_cpus::get(),
            total_memory_bytes: sys.total_memory(),
        }
    }
}

fn current_user() -> String {
    ["USER", "USERNAME", "LOGNAME"]
        .iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
        .unwrap_or_else(|| UNKNOWN.to_string())
}
