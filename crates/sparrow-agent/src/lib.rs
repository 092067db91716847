//! sparrow agent library entry.
//!
//! This crate wires the check runners, their metric sets, the exposition
//! registry, config loading/reloading and the ops HTTP endpoints into one
//! agent. It is consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod checks;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
