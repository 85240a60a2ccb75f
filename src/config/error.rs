//! Error types for configuration loading.

use crate::error::LinkError;
use thiserror::Error;

/// Errors raised while building the station configuration at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration source could not be read or deserialized.
    #[error("Configuration source error: {0}")]
    Source(#[from] ::config::ConfigError),

    /// A timeout was configured as zero.
    #[error("Invalid timeout for {key}: must be greater than zero")]
    InvalidTimeout { key: &'static str },

    /// The tag catalog is missing an entry the dispatcher or the poller needs.
    #[error("Tag catalog is incomplete: {0}")]
    Catalog(#[from] LinkError),
}
