// src/track/mod.rs

//! On-disk run-tracking artifacts.
//!
//! - [`durable_log`]: the append-only run log.
//! - [`markers`]: per-step begin/end/error marker files.
//! - [`cancel`]: the stop file checked before each step.
//! - [`inventory`]: host facts recorded in begin markers.

pub mod cancel;
pub mod durable_log;
pub mod inventory;
pub mod markers;

pub use cancel::{STOP_FILE, should_abort};
pub use durable_log::DurableLog;
pub use inventory::{HostInventory, HostSnapshot, SystemInventory};
pub use markers::{LifecycleMarker, ProcessIdentity, marker_file_name, marker_path};
