//! Application-level orchestration.
//!
//! Owns run lifecycle control (start/stop/restart) so UI and CLI layers can
//! issue commands freely while the engine's single-run invariant holds.

mod controller;

pub use controller::{run_controller, UiCommand};
