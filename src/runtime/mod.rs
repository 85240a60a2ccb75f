//! Process-level setup for the `pilot-link` binary.
//!
//! - [`setup_tracing`] - installs the global `tracing` subscriber
//!
//! The station lifecycle itself lives in [`crate::station`].

pub mod tracing;

pub use self::tracing::*;
