//! sparrow core: runtime-agnostic primitives shared by the agent.
//!
//! This crate defines the error surface and the target-set algebra used when
//! a configuration reload prunes metric series. It intentionally carries no
//! runtime dependencies so it can be reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod target;

/// Shared result type.
pub use error::{ErrorCode, Result, SparrowError};
pub use target::{obsolete_targets, Target};
