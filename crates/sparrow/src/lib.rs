//! Top-level facade crate for sparrow.
//!
//! Re-exports core types and the agent library so users can depend on a single crate.

pub mod core {
    pub use sparrow_core::*;
}

pub mod agent {
    pub use sparrow_agent::*;
}
