// src/engine/mod.rs

//! Run orchestration.
//!
//! - [`context`] holds the explicit per-run state ([`RunContext`]) that
//!   replaces process-wide globals: settings, collaborators, the open run
//!   log and the cached host snapshot.
//! - [`controller`] drives the declared steps in order and turns the first
//!   failure or cancellation into the run's exit code.

pub mod context;
pub mod controller;

pub use context::{RunContext, RunServices, RunSettings};
pub use controller::{RunController, RunOutcome};
